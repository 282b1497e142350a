//! Scheduling restraints

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Immutable scheduling constraints for one planning run.
///
/// Violating any of these always surfaces as an explicit failure; the engine
/// never silently relaxes a restraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restraints {
    /// Course ids offered in person.
    pub in_person_courses: Vec<String>,
    /// Minimum required in-person courses per qualifying session (hard).
    pub min_in_person: Option<usize>,
    /// Maximum allowed in-person courses per session (soft).
    pub max_in_person: Option<usize>,
    /// Last date on which in-person offerings exist.
    pub in_person_end_date: Option<NaiveDate>,
    /// Maximum learner-paid cost per session after aid.
    pub max_session_cost: Option<f64>,
    /// Minimum classes per session.
    pub min_classes: usize,
    /// Maximum classes per session.
    pub max_classes: usize,
    /// Whether scheduling may exceed available benefits.
    pub exceed_benefits: bool,
    /// Target number of sessions to spread load across, when fixed.
    pub spread_between: Option<usize>,
}

impl Default for Restraints {
    fn default() -> Self {
        Self {
            in_person_courses: Vec::new(),
            min_in_person: None,
            max_in_person: None,
            in_person_end_date: None,
            max_session_cost: None,
            min_classes: 2,
            max_classes: 4,
            exceed_benefits: false,
            spread_between: None,
        }
    }
}

impl Restraints {
    /// Whether a course id is on the in-person list.
    #[must_use]
    pub fn is_in_person(&self, course_id: &str) -> bool {
        self.in_person_courses.iter().any(|id| id == course_id)
    }
}
