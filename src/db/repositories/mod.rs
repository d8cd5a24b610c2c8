//! Database repositories
//!
//! Repositories handle all direct database interactions.

pub mod contest_repo;
pub mod contest_submission_repo;
pub mod first_blood_repo;
pub mod standings_repo;

pub use contest_repo::ContestRepository;
pub use contest_submission_repo::ContestSubmissionRepository;
pub use first_blood_repo::FirstBloodRepository;
pub use standings_repo::StandingsRepository;
