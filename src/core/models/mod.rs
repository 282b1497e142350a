//! Data models for `EnrollPlan`

pub mod course;
pub mod restraints;
pub mod session;
pub mod user;

pub use course::{Course, Level, Requirement, Status};
pub use restraints::Restraints;
pub use session::Session;
pub use user::User;
