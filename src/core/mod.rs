//! Core module for the session-planning pipeline

pub mod calendar;
pub mod config;
pub mod errors;
pub mod intake;
pub mod ledger;
pub mod models;
pub mod priority;
pub mod report;
pub mod scheduler;

/// Returns the current version of the `EnrollPlan` crate
#[must_use]
pub const fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
