//! Session model

use crate::core::config::round_cents;
use crate::core::errors::{PlanError, Result};
use crate::core::models::{Course, Level};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Net-cost rounding slack in dollars.
const COST_TOLERANCE: f64 = 0.01;

/// One fixed-length enrollment period.
///
/// The session number doubles as its ordering/equality key; two sessions with
/// the same number are the same session regardless of object identity.
/// Courses are referenced by id; the learner's catalog owns the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Sequential session number.
    pub number: u32,
    /// First day of the session.
    pub start_date: NaiveDate,
    /// Last day of the session.
    pub end_date: NaiveDate,
    /// Tier every placed course must match.
    pub level: Level,

    courses: Vec<String>,
    intent: Vec<String>,
    total_credit_hours: u32,
    gross_cost: f64,

    /// Grant dollars applied against the gross cost.
    pub grants_applied: f64,
    /// Benefit-ledger dollars applied against the gross cost.
    pub benefit_applied: f64,
    /// Cost left to the learner after all aid.
    pub learner_cost: f64,
}

impl Session {
    /// Create an empty session.
    ///
    /// # Arguments
    /// * `number` - Sequential session number
    /// * `start_date` - First day (already holiday-rounded)
    /// * `level` - Tier this session serves
    /// * `weeks` - Session length in weeks
    /// * `session_fee` - Flat per-session fee (seed of the gross cost)
    #[must_use]
    pub fn new(number: u32, start_date: NaiveDate, level: Level, weeks: u32, session_fee: f64) -> Self {
        Self {
            number,
            start_date,
            end_date: start_date + Duration::weeks(i64::from(weeks)),
            level,
            courses: Vec::new(),
            intent: Vec::new(),
            total_credit_hours: 0,
            gross_cost: round_cents(session_fee),
            grants_applied: 0.0,
            benefit_applied: 0.0,
            learner_cost: 0.0,
        }
    }

    /// Place a course into this session, updating the running totals.
    ///
    /// # Errors
    /// Returns [`PlanError::DataIntegrity`] when the course level does not
    /// match the session level, or the course is already placed here.
    pub fn add_course(&mut self, course: &Course) -> Result<()> {
        if course.level != self.level {
            return Err(PlanError::DataIntegrity(format!(
                "course '{}' is {} but session {} is {}",
                course.id, course.level, self.number, self.level
            )));
        }
        if self.courses.iter().any(|id| id == &course.id) {
            return Err(PlanError::DataIntegrity(format!(
                "course '{}' placed twice in session {}",
                course.id, self.number
            )));
        }

        self.courses.push(course.id.clone());
        self.total_credit_hours += course.credit_hours;
        self.gross_cost = round_cents(self.gross_cost + course.cost());
        Ok(())
    }

    /// Attach an intent course (no capacity slot consumed, no cost).
    pub fn add_intent(&mut self, course_id: String) {
        if !self.intent.contains(&course_id) {
            self.intent.push(course_id);
        }
    }

    /// Record applied aid and the resulting learner cost.
    ///
    /// # Errors
    /// Returns [`PlanError::DataIntegrity`] when the applied aid exceeds the
    /// gross cost beyond rounding slack.
    pub fn apply_aid(&mut self, grants: f64, benefit: f64) -> Result<()> {
        let learner = round_cents(self.gross_cost - grants - benefit);
        if learner < -COST_TOLERANCE {
            return Err(PlanError::DataIntegrity(format!(
                "session {} aid {:.2} exceeds gross cost {:.2}",
                self.number,
                grants + benefit,
                self.gross_cost
            )));
        }

        self.grants_applied = grants;
        self.benefit_applied = benefit;
        self.learner_cost = learner.max(0.0);
        Ok(())
    }

    /// Ids of courses placed in this session, in placement order.
    #[must_use]
    pub fn courses(&self) -> &[String] {
        &self.courses
    }

    /// Ids of attached intent courses.
    #[must_use]
    pub fn intent(&self) -> &[String] {
        &self.intent
    }

    /// Number of placed courses.
    #[must_use]
    pub const fn course_count(&self) -> usize {
        self.courses.len()
    }

    /// Total credit hours of placed courses.
    #[must_use]
    pub const fn total_credit_hours(&self) -> u32 {
        self.total_credit_hours
    }

    /// Gross cost (session fee plus placed course costs).
    #[must_use]
    pub const fn gross_cost(&self) -> f64 {
        self.gross_cost
    }

    /// Session length in days.
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Whether the session has started as of `date`.
    #[must_use]
    pub fn has_started(&self, date: NaiveDate) -> bool {
        self.start_date <= date
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Eq for Session {}

impl PartialOrd for Session {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Session {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.number.cmp(&other.number)
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Session {} ({}): [{}]",
            self.number,
            self.start_date,
            self.courses.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CostRates;
    use crate::core::models::Status;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rates() -> CostRates {
        CostRates {
            per_credit_undergrad: 500.0,
            per_credit_grad: 700.0,
            per_course_fee: 100.0,
            per_session_fee: 40.0,
            alumni_discount_percent: 20.0,
        }
    }

    fn course(id: &str, level: Level) -> Course {
        Course::new(
            id.to_string(),
            3,
            Status::None,
            level,
            Vec::new(),
            false,
            None,
            false,
            false,
            &rates(),
        )
        .unwrap()
    }

    #[test]
    fn test_session_dates() {
        let session = Session::new(1, date(2025, 9, 7), Level::Undergraduate, 8, 40.0);
        assert_eq!(session.end_date, date(2025, 11, 2));
        assert_eq!(session.duration_days(), 56);
        assert!(session.has_started(date(2025, 9, 7)));
        assert!(!session.has_started(date(2025, 9, 6)));
    }

    #[test]
    fn test_add_course_totals() {
        let mut session = Session::new(1, date(2025, 9, 7), Level::Undergraduate, 8, 40.0);
        session.add_course(&course("ENG101", Level::Undergraduate)).unwrap();
        session.add_course(&course("HIS101", Level::Undergraduate)).unwrap();

        assert_eq!(session.course_count(), 2);
        assert_eq!(session.total_credit_hours(), 6);
        // 40 + 2 * (3*500 + 100) = 3240
        assert!((session.gross_cost() - 3240.0).abs() < 1e-9);
    }

    #[test]
    fn test_level_mismatch_rejected() {
        let mut session = Session::new(1, date(2025, 9, 7), Level::Undergraduate, 8, 40.0);
        let result = session.add_course(&course("CS6001", Level::Graduate));
        assert!(matches!(result, Err(PlanError::DataIntegrity(_))));
        assert_eq!(session.course_count(), 0);
    }

    #[test]
    fn test_duplicate_placement_rejected() {
        let mut session = Session::new(1, date(2025, 9, 7), Level::Undergraduate, 8, 40.0);
        session.add_course(&course("ENG101", Level::Undergraduate)).unwrap();
        let result = session.add_course(&course("ENG101", Level::Undergraduate));
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_aid_caps_negative() {
        let mut session = Session::new(1, date(2025, 9, 7), Level::Undergraduate, 8, 40.0);
        session.add_course(&course("ENG101", Level::Undergraduate)).unwrap();

        // Within rounding slack
        session.apply_aid(40.0, 1600.005).unwrap();
        assert!(session.learner_cost.abs() < 1e-9);

        // Clearly over-applied
        let result = session.apply_aid(40.0, 1700.0);
        assert!(matches!(result, Err(PlanError::DataIntegrity(_))));
    }

    #[test]
    fn test_number_is_equality_key() {
        let a = Session::new(3, date(2025, 9, 7), Level::Undergraduate, 8, 40.0);
        let b = Session::new(3, date(2026, 1, 4), Level::Graduate, 8, 40.0);
        let c = Session::new(4, date(2025, 9, 7), Level::Undergraduate, 8, 40.0);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn test_intent_no_cost_no_slot() {
        let mut session = Session::new(1, date(2025, 9, 7), Level::Undergraduate, 8, 40.0);
        session.add_intent("SOC101".to_string());
        session.add_intent("SOC101".to_string());

        assert_eq!(session.intent(), ["SOC101".to_string()]);
        assert_eq!(session.course_count(), 0);
        assert!((session.gross_cost() - 40.0).abs() < 1e-9);
    }
}
