//! Core business logic for survey-rs.
//!
//! Services here hold the rules for poll and question definitions, vote ballots and
//! results, on top of the repositories in `survey-db`.

pub mod services;

pub use services::*;
