//! Contest request DTOs

use serde::Deserialize;

use crate::constants::DEFAULT_STANDINGS_PAGE_SIZE;

/// Standings query parameters
#[derive(Debug, Default, Deserialize)]
pub struct StandingsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl StandingsQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_STANDINGS_PAGE_SIZE)
    }
}
