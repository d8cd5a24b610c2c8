//! Retry delays

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with "equal jitter": half the delay is fixed, the
/// other half random. `attempt` is 1-based; attempt 0 waits nothing.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 || base_ms == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exp_factor).min(max_ms);

    let half = delay_ms / 2;
    let jitter = if half > 0 {
        rand::rng().random_range(0..=half)
    } else {
        0
    };

    Duration::from_millis(delay_ms - half + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_within_base() {
        for _ in 0..50 {
            let delay = calculate_backoff(1, 1_000, 60_000);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1_000));
        }
    }

    #[test]
    fn test_grows_exponentially() {
        for _ in 0..50 {
            let delay = calculate_backoff(4, 1_000, 60_000);
            assert!(delay >= Duration::from_millis(4_000));
            assert!(delay <= Duration::from_millis(8_000));
        }
    }

    #[test]
    fn test_capped_at_max() {
        let delay = calculate_backoff(30, 1_000, 60_000);
        assert!(delay <= Duration::from_millis(60_000));
        assert!(delay >= Duration::from_millis(30_000));
    }

    #[test]
    fn test_zero_cases() {
        assert_eq!(calculate_backoff(0, 1_000, 60_000), Duration::ZERO);
        assert_eq!(calculate_backoff(3, 0, 60_000), Duration::ZERO);
    }
}
