//! Schedule report generation
//!
//! Consumes a finalized schedule and renders the per-session table
//! (Session, Start Date, Courses, Intent Courses, Total CH, Total Cost,
//! User Cost) in Markdown or CSV.

pub mod csv;
pub mod markdown;

use crate::core::config::round_cents;
use crate::core::errors::Result;
use crate::core::models::User;
use chrono::NaiveDate;
use std::path::Path;

pub use csv::CsvReporter;
pub use markdown::MarkdownReporter;

/// One report row per committed session.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    /// Session number.
    pub number: u32,
    /// Session start date.
    pub start_date: NaiveDate,
    /// Placed course ids, in placement order.
    pub courses: Vec<String>,
    /// Attached intent course ids.
    pub intent: Vec<String>,
    /// Total credit hours.
    pub credit_hours: u32,
    /// Gross session cost.
    pub gross_cost: f64,
    /// Cost left to the learner after aid.
    pub learner_cost: f64,
}

/// Flattened view of a learner's finalized schedule.
#[derive(Debug, Clone)]
pub struct ScheduleReport {
    /// Learner identifier.
    pub learner_id: String,
    /// Rows in session order.
    pub rows: Vec<ScheduleRow>,
}

impl ScheduleReport {
    /// Build a report from the learner's committed schedule.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        let mut sessions: Vec<_> = user.schedule.iter().collect();
        sessions.sort_by_key(|s| s.number);

        let rows = sessions
            .into_iter()
            .map(|s| ScheduleRow {
                number: s.number,
                start_date: s.start_date,
                courses: s.courses().to_vec(),
                intent: s.intent().to_vec(),
                credit_hours: s.total_credit_hours(),
                gross_cost: s.gross_cost(),
                learner_cost: s.learner_cost,
            })
            .collect();

        Self {
            learner_id: user.id.clone(),
            rows,
        }
    }

    /// Total gross cost across all sessions.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        round_cents(self.rows.iter().map(|r| r.gross_cost).sum())
    }

    /// Total learner-paid cost across all sessions.
    #[must_use]
    pub fn total_learner_cost(&self) -> f64 {
        round_cents(self.rows.iter().map(|r| r.learner_cost).sum())
    }

    /// Total credit hours across all sessions.
    #[must_use]
    pub fn total_credit_hours(&self) -> u32 {
        self.rows.iter().map(|r| r.credit_hours).sum()
    }
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Generate a report to a file
    ///
    /// # Errors
    /// Returns an error if report generation or file writing fails
    fn generate(&self, report: &ScheduleReport, output_path: &Path) -> Result<()>;

    /// Generate report content as a string
    ///
    /// # Errors
    /// Returns an error if report generation fails
    fn render(&self, report: &ScheduleReport) -> Result<String>;
}
