//! Error taxonomy for the planning pipeline
//!
//! Every failure surfaces as one of four variants; constraint violations are
//! never auto-relaxed into a best-effort schedule.

use thiserror::Error;

/// Errors raised by intake, ranking, calendar generation, and allocation.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Malformed or internally inconsistent course/session records.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// The prerequisite graph contains a cycle.
    #[error("cyclic prerequisite dependency detected at '{course}'")]
    CyclicDependency {
        /// Course id at which the cycle was detected.
        course: String,
    },

    /// A valid schedule cannot be created under the given restraints.
    #[error("scheduling failed: {0}")]
    Scheduling(String),

    /// A bounded retry loop exhausted its attempt budget.
    #[error("retry budget exhausted after {attempts} attempts: {context}")]
    RecursionLimit {
        /// Attempts made before giving up.
        attempts: u32,
        /// What was being retried.
        context: String,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PlanError>;
