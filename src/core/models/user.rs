//! Learner aggregate

use crate::core::ledger::BenefitLedger;
use crate::core::models::{Course, Level, Session};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The learner aggregate: exclusively owns the course catalog, the committed
/// schedule, the not-yet-committed free sessions, and the benefit ledger.
///
/// Courses live in the insertion-ordered catalog and are referenced by id
/// from sessions and the satisfied list; a session lives in exactly one of
/// `schedule`/`free_sessions` and is moved, never copied, when committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique learner identifier.
    pub id: String,
    /// Target start date of the first session. Its month must be one of the
    /// configured anchor months.
    pub first_session_date: NaiveDate,
    /// Date the plan is computed as of; sessions starting on or before this
    /// are treated as historical.
    pub as_of: NaiveDate,
    /// Full course catalog, insertion-ordered.
    pub courses: Vec<Course>,
    /// Committed sessions.
    pub schedule: Vec<Session>,
    /// Generated sessions not yet committed.
    pub free_sessions: Vec<Session>,
    /// Grant dollars available per session.
    pub grants_per_session: f64,
    /// Benefit ledger, when the learner has entitlement to track.
    pub ledger: Option<BenefitLedger>,

    satisfied: Vec<String>,
}

impl User {
    /// Create a learner aggregate. Validation of the course records is the
    /// intake collaborator's responsibility.
    #[must_use]
    pub fn new(
        id: String,
        first_session_date: NaiveDate,
        as_of: NaiveDate,
        courses: Vec<Course>,
        grants_per_session: f64,
        ledger: Option<BenefitLedger>,
    ) -> Self {
        Self {
            id,
            first_session_date,
            as_of,
            courses,
            schedule: Vec::new(),
            free_sessions: Vec::new(),
            grants_per_session,
            ledger,
            satisfied: Vec::new(),
        }
    }

    /// Look up a course by id.
    #[must_use]
    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// Ids of courses satisfied so far (scheduled, completed, or intent), in
    /// the order they were satisfied.
    #[must_use]
    pub fn satisfied(&self) -> &[String] {
        &self.satisfied
    }

    /// Whether a course id has been satisfied.
    #[must_use]
    pub fn is_satisfied(&self, id: &str) -> bool {
        self.satisfied.iter().any(|s| s == id)
    }

    /// Record a course as satisfied. Duplicates are ignored.
    pub fn mark_satisfied(&mut self, id: String) {
        if !self.is_satisfied(&id) {
            self.satisfied.push(id);
        }
    }

    /// Count courses at `level` that still need a session slot.
    #[must_use]
    pub fn placeable_count(&self, level: Level) -> usize {
        self.courses
            .iter()
            .filter(|c| c.level == level && c.is_placeable())
            .count()
    }

    /// Remove and return a free session by number.
    pub fn take_free_session(&mut self, number: u32) -> Option<Session> {
        self.free_sessions
            .iter()
            .position(|s| s.number == number)
            .map(|i| self.free_sessions.remove(i))
    }

    /// Remove and return a committed session by number.
    pub fn take_scheduled_session(&mut self, number: u32) -> Option<Session> {
        self.schedule
            .iter()
            .position(|s| s.number == number)
            .map(|i| self.schedule.remove(i))
    }

    /// Whether any session (committed or free) carries this number.
    #[must_use]
    pub fn has_session(&self, number: u32) -> bool {
        self.schedule.iter().any(|s| s.number == number)
            || self.free_sessions.iter().any(|s| s.number == number)
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

    fn course(id: &str, level: Level, status: Status) -> Course {
        Course::new(
            id.to_string(),
            3,
            status,
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

    fn user(courses: Vec<Course>) -> User {
        User::new(
            "learner-1".to_string(),
            date(2025, 9, 1),
            date(2025, 6, 1),
            courses,
            0.0,
            None,
        )
    }

    #[test]
    fn test_satisfied_dedup_and_order() {
        let mut u = user(Vec::new());
        u.mark_satisfied("B".to_string());
        u.mark_satisfied("A".to_string());
        u.mark_satisfied("B".to_string());

        assert_eq!(u.satisfied(), ["B".to_string(), "A".to_string()]);
        assert!(u.is_satisfied("A"));
        assert!(!u.is_satisfied("C"));
    }

    #[test]
    fn test_placeable_count_skips_completed() {
        let u = user(vec![
            course("A", Level::Undergraduate, Status::None),
            course("B", Level::Undergraduate, Status::Completed),
            course("C", Level::Graduate, Status::None),
        ]);

        assert_eq!(u.placeable_count(Level::Undergraduate), 1);
        assert_eq!(u.placeable_count(Level::Graduate), 1);
    }

    #[test]
    fn test_take_free_session() {
        let mut u = user(Vec::new());
        u.free_sessions.push(Session::new(
            2,
            date(2025, 9, 7),
            Level::Undergraduate,
            8,
            40.0,
        ));

        assert!(u.has_session(2));
        let session = u.take_free_session(2).unwrap();
        assert_eq!(session.number, 2);
        assert!(!u.has_session(2));
        assert!(u.take_free_session(2).is_none());
    }
}
