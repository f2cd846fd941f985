//! Core domain concepts shared across all subdomains.
//!
//! - [`error::VotingError`]: rejected round requests and votes
//! - [`validation::ConfigIssue`]: structured configuration problems

pub mod error;
pub mod validation;
