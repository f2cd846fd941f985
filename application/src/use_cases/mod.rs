//! Use cases (application services)
//!
//! - [`voting_engine`]: time-bounded weighted voting rounds
//! - [`authority`]: the Coordinating Authority's decision cycles

pub mod authority;
pub mod voting_engine;
