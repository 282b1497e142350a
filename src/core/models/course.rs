//! Course model

use crate::core::config::CostRates;
use crate::core::errors::{PlanError, Result};
use serde::{Deserialize, Serialize};

/// Course tier. Pricing and discount rules differ per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Undergraduate tier (no discount).
    Undergraduate,
    /// Graduate tier (alumni discount applies).
    Graduate,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undergraduate => write!(f, "undergraduate"),
            Self::Graduate => write!(f, "graduate"),
        }
    }
}

/// Completion status of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Not started.
    #[default]
    None,
    /// Currently being taken (carries a fixed session number).
    InProgress,
    /// Finished (counts as a satisfied prerequisite).
    Completed,
}

/// One term of a prerequisite expression.
///
/// An expression is an ordered list of terms, all of which must hold:
/// a `Course` term names a single mandatory prior course, an `AnyOf`
/// term is satisfied by any one of its alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    /// Single mandatory prerequisite (AND term).
    Course(String),
    /// Group of alternatives, at least one required (OR group).
    AnyOf(Vec<String>),
}

impl Requirement {
    /// Iterate over every course id mentioned by this term.
    pub fn course_ids(&self) -> impl Iterator<Item = &str> + '_ {
        let ids: &[String] = match self {
            Self::Course(id) => std::slice::from_ref(id),
            Self::AnyOf(ids) => ids,
        };
        ids.iter().map(String::as_str)
    }
}

/// Represents one course in the learner's catalog.
///
/// Cost is computed once at construction from the level's per-credit-hour
/// rate, the flat per-course fee, and the level discount, and never changes
/// afterwards. Priority is recomputed on every ranking pass and has no
/// effect on cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier (e.g., "MATH1201").
    pub id: String,

    /// Credit hours (whole, positive).
    pub credit_hours: u32,

    /// Completion status.
    pub status: Status,

    /// Course tier.
    pub level: Level,

    /// Prerequisite expression; empty means no prerequisites.
    pub prereqs: Vec<Requirement>,

    /// Must land in the final session of its level.
    pub capstone: bool,

    /// Fixed session number, when pre-assigned/in-progress/completed.
    pub session: Option<u32>,

    /// Learner intends to satisfy this via transfer credit.
    pub transfer_intent: bool,

    /// Learner intends to satisfy this via challenge exam.
    pub challenge_intent: bool,

    /// Ranking score; higher schedules earlier. Recomputed per pass.
    pub priority: i32,

    /// Monetary cost, fixed at construction.
    cost: f64,
}

impl Course {
    /// Create a new course, deriving its cost from `rates`.
    ///
    /// # Errors
    /// Returns [`PlanError::DataIntegrity`] if `credit_hours` is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        credit_hours: u32,
        status: Status,
        level: Level,
        prereqs: Vec<Requirement>,
        capstone: bool,
        session: Option<u32>,
        transfer_intent: bool,
        challenge_intent: bool,
        rates: &CostRates,
    ) -> Result<Self> {
        if credit_hours == 0 {
            return Err(PlanError::DataIntegrity(format!(
                "course '{id}' has zero credit hours"
            )));
        }

        let cost = rates.course_cost(level, credit_hours);

        Ok(Self {
            id,
            credit_hours,
            status,
            level,
            prereqs,
            capstone,
            session,
            transfer_intent,
            challenge_intent,
            priority: 0,
            cost,
        })
    }

    /// Monetary cost of the course, rounded to cents.
    #[must_use]
    pub const fn cost(&self) -> f64 {
        self.cost
    }

    /// Whether the learner plans to satisfy this outside normal scheduling.
    #[must_use]
    pub const fn is_intent(&self) -> bool {
        self.transfer_intent || self.challenge_intent
    }

    /// Whether the course still needs a session slot.
    #[must_use]
    pub fn is_placeable(&self) -> bool {
        self.session.is_none() && self.status == Status::None && !self.is_intent()
    }
}
