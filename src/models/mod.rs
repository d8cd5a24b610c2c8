//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod contest;
pub mod dead_letter;
pub mod event;
pub mod standings;
pub mod submission;

pub use contest::*;
pub use dead_letter::*;
pub use event::*;
pub use standings::*;
pub use submission::*;
