//! Allocation engine
//!
//! Drives a course through Unplaced -> Fixed-Assigned | Free-Eligible ->
//! Scheduled. Fixed/completed courses land first, then the remaining pool is
//! distributed into future sessions under capacity, in-person, cost, and
//! prerequisite constraints. Every level is placed against value copies of
//! the ledger and session state; only a fully valid level commits, so a
//! failed tentative branch never leaks mutation into the committed schedule.

pub mod targets;

use crate::core::calendar;
use crate::core::config::{round_cents, PlannerSettings};
use crate::core::errors::{PlanError, Result};
use crate::core::ledger::BenefitLedger;
use crate::core::models::{Level, Requirement, Restraints, Session, Status, User};
use crate::core::priority::rank_courses;
use crate::{debug, info};

/// Outcome of a tentative level placement, committed only as a whole.
struct LevelOutcome {
    sessions: Vec<Session>,
    ledger: Option<BenefitLedger>,
}

/// How a tentative placement failed.
enum PlaceFailure {
    /// The session at `session_index` broke its cost ceiling; worth
    /// retrying with an adjusted target distribution.
    Cost {
        session_index: usize,
        error: PlanError,
    },
    /// Not recoverable by moving load around.
    Fatal(PlanError),
}

type PlaceResult<T> = std::result::Result<T, PlaceFailure>;

/// Constraint-checked allocation engine for one learner.
pub struct Scheduler<'a> {
    settings: &'a PlannerSettings,
    restraints: &'a Restraints,
}

impl<'a> Scheduler<'a> {
    /// Create an engine over validated settings and restraints.
    #[must_use]
    pub const fn new(settings: &'a PlannerSettings, restraints: &'a Restraints) -> Self {
        Self {
            settings,
            restraints,
        }
    }

    /// Run the full pipeline: priority ranking, session generation, fixed
    /// assignment with historical ledger catch-up, free assignment, intent
    /// placement.
    ///
    /// # Errors
    /// Surfaces every failure from the phases below; a returned error leaves
    /// previously committed sessions and ledger state intact.
    pub fn run(&self, user: &mut User) -> Result<()> {
        info!("Planning schedule for {}", user.id);

        self.rank_levels(user)?;
        self.assign_fixed(user)?;

        let mut generated = calendar::create_sessions(user, self.restraints, self.settings)?;
        debug!("Generated {} free sessions", generated.len());
        user.free_sessions.append(&mut generated);
        user.free_sessions.sort();

        Self::catch_up_ledger(user);
        self.assign_free(user)?;
        self.place_intents(user)?;

        info!(
            "Schedule complete: {} sessions committed for {}",
            user.schedule.len(),
            user.id
        );
        Ok(())
    }

    /// Recompute priorities per level and reorder the catalog so iteration
    /// order equals scheduling preference order.
    fn rank_levels(&self, user: &mut User) -> Result<()> {
        let courses = std::mem::take(&mut user.courses);
        let (mut under, mut grad): (Vec<_>, Vec<_>) = courses
            .into_iter()
            .partition(|c| c.level == Level::Undergraduate);

        let ranked_under = rank_courses(
            &mut under,
            &self.settings.weights,
            &self.restraints.in_person_courses,
        );
        let ranked_grad = rank_courses(
            &mut grad,
            &self.settings.weights,
            &self.restraints.in_person_courses,
        );

        under.extend(grad);
        user.courses = under;

        ranked_under?;
        ranked_grad
    }

    /// Phase 1: place every course carrying a fixed session number or a
    /// completed status.
    fn assign_fixed(&self, user: &mut User) -> Result<()> {
        let fixed: Vec<(String, Option<u32>)> = user
            .courses
            .iter()
            .filter(|c| c.session.is_some() || c.status == Status::Completed)
            .map(|c| (c.id.clone(), c.session))
            .collect();

        for (id, number) in fixed {
            let Some(number) = number else {
                // Completed without a session: satisfied, no slot consumed
                user.mark_satisfied(id);
                continue;
            };

            let course = user
                .course(&id)
                .cloned()
                .ok_or_else(|| PlanError::DataIntegrity(format!("unknown course id '{id}'")))?;

            let mut session = match user
                .take_scheduled_session(number)
                .or_else(|| user.take_free_session(number))
            {
                Some(session) => session,
                None => {
                    let start =
                        calendar::anchor_start(self.settings, user.first_session_date, number)?;
                    Session::new(
                        number,
                        start,
                        course.level,
                        self.settings.sessions.weeks,
                        self.settings.costs.per_session_fee,
                    )
                }
            };

            if session.level != course.level {
                return Err(PlanError::DataIntegrity(format!(
                    "course '{}' fixed to session {number} of a different level",
                    course.id
                )));
            }
            session.add_course(&course)?;

            // Started sessions are history; future pre-assigned sessions
            // stay in the free pool so they can be topped up to target
            if session.has_started(user.as_of) {
                user.schedule.push(session);
            } else {
                user.free_sessions.push(session);
            }
            user.mark_satisfied(id);
        }

        user.schedule.sort();
        user.free_sessions.sort();
        Ok(())
    }

    /// One-time historical ledger catch-up for sessions that have already
    /// started or completed. Idempotent per session number.
    fn catch_up_ledger(user: &mut User) {
        let grants = user.grants_per_session;
        let committed = user.schedule.clone();
        if let Some(ledger) = user.ledger.as_mut() {
            let refs: Vec<&Session> = committed.iter().collect();
            ledger.charge_historical(&refs, grants);
        }
    }

    /// Phases 2 and 3: distribute the remaining pool into future sessions,
    /// level by level.
    fn assign_free(&self, user: &mut User) -> Result<()> {
        let as_of = user.as_of;
        user.free_sessions.retain(|s| s.start_date >= as_of);

        // Intent courses leave the pool immediately; satisfied, no slot
        let intents: Vec<String> = user
            .courses
            .iter()
            .filter(|c| c.is_intent() && !user.is_satisfied(&c.id))
            .map(|c| c.id.clone())
            .collect();
        for id in intents {
            debug!("Intent course '{id}' satisfied outside sessions");
            user.mark_satisfied(id);
        }

        for level in [Level::Undergraduate, Level::Graduate] {
            let pool: Vec<String> = user
                .courses
                .iter()
                .filter(|c| c.level == level && !user.is_satisfied(&c.id))
                .map(|c| c.id.clone())
                .collect();
            let sessions: Vec<Session> = user
                .free_sessions
                .iter()
                .filter(|s| s.level == level)
                .cloned()
                .collect();

            if pool.is_empty() {
                // Only pre-assigned sessions can remain for this level;
                // commit them as they stand
                if !sessions.is_empty() {
                    self.commit_preassigned(user, &sessions)?;
                }
                continue;
            }
            if sessions.is_empty() {
                return Err(PlanError::Scheduling(format!(
                    "{level} courses vs sessions discrepancy ({} courses, no sessions)",
                    pool.len()
                )));
            }

            self.schedule_level(user, level, &pool, &sessions)?;
        }
        Ok(())
    }

    /// Place one level's pool, backtracking through target adjustments when
    /// a session breaks its cost ceiling.
    fn schedule_level(
        &self,
        user: &mut User,
        level: Level,
        pool: &[String],
        sessions: &[Session],
    ) -> Result<()> {
        let r = self.restraints;
        let mut tgt = targets::distribute(pool.len(), sessions.len(), r.min_classes, r.max_classes)?;

        for attempt in 0..self.settings.max_attempts {
            match self.place_level(user, pool, sessions, &tgt) {
                Ok(outcome) => {
                    Self::commit_level(user, outcome);
                    return Ok(());
                }
                Err(PlaceFailure::Cost {
                    session_index,
                    error,
                }) => {
                    debug!("Placement attempt {attempt} failed: {error}");
                    match targets::shift_load(&tgt, session_index, r.min_classes, r.max_classes) {
                        Some(adjusted) => tgt = adjusted,
                        None => return Err(error),
                    }
                }
                Err(PlaceFailure::Fatal(error)) => return Err(error),
            }
        }

        Err(PlanError::RecursionLimit {
            attempts: self.settings.max_attempts,
            context: format!("target adjustment for {level} sessions"),
        })
    }

    /// Attempt one full level placement against value copies. Nothing the
    /// learner owns is touched; the caller commits the outcome.
    fn place_level(
        &self,
        user: &User,
        pool: &[String],
        sessions: &[Session],
        tgt: &[usize],
    ) -> PlaceResult<LevelOutcome> {
        let mut ledger = user.ledger.clone();
        let mut satisfied: Vec<String> = user.satisfied().to_vec();
        let mut remaining: Vec<String> = pool.to_vec();
        let mut placed: Vec<Session> = Vec::new();

        for (i, session) in sessions.iter().enumerate() {
            let mut session = session.clone();
            let target = tgt[i];

            // Pool order is priority order; the filter keeps it
            let mut qualified: Vec<String> = remaining
                .iter()
                .filter(|id| Self::prereqs_met(user, id, &satisfied))
                .cloned()
                .collect();

            // Targets count courses drawn from the pool; a pre-assigned
            // session keeps its fixed courses on top of its target
            let mut added = self.fill_in_person(user, &mut session, &mut qualified, &mut remaining)?;

            let r = self.restraints;
            while added < target {
                if qualified.is_empty() {
                    return Err(PlaceFailure::Fatal(PlanError::Scheduling(format!(
                        "session {}: out of prerequisite-qualified courses",
                        session.number
                    ))));
                }

                let in_person_count = session
                    .courses()
                    .iter()
                    .filter(|id| r.is_in_person(id))
                    .count();
                let allow_in_person = r.max_in_person.map_or(true, |m| in_person_count < m);
                let Some(pos) = qualified
                    .iter()
                    .position(|id| allow_in_person || !r.is_in_person(id))
                else {
                    return Err(PlaceFailure::Fatal(PlanError::Scheduling(format!(
                        "session {}: only in-person courses remain but the in-person maximum is reached",
                        session.number
                    ))));
                };

                let id = qualified.remove(pos);
                remaining.retain(|q| q != &id);
                Self::add_by_id(user, &mut session, &id)?;
                added += 1;
            }

            self.charge_session(user, &mut session, ledger.as_mut(), i)?;

            satisfied.extend(session.courses().iter().cloned());
            placed.push(session);
        }

        if !remaining.is_empty() {
            return Err(PlaceFailure::Fatal(PlanError::Scheduling(format!(
                "courses left unplaced after all sessions filled: {remaining:?}"
            ))));
        }

        Ok(LevelOutcome {
            sessions: placed,
            ledger,
        })
    }

    /// Pull the in-person minimum into the session first, when the session
    /// falls on or before the in-person cutoff. Returns how many courses
    /// were placed (they count toward the session's target).
    fn fill_in_person(
        &self,
        user: &User,
        session: &mut Session,
        qualified: &mut Vec<String>,
        remaining: &mut Vec<String>,
    ) -> PlaceResult<usize> {
        let r = self.restraints;
        if r.in_person_courses.is_empty() {
            return Ok(0);
        }
        let Some(cutoff) = r.in_person_end_date else {
            return Err(PlaceFailure::Fatal(PlanError::Scheduling(
                "in-person scheduling requires an in-person end date".to_string(),
            )));
        };
        if session.start_date > cutoff {
            return Ok(0);
        }

        let min_needed = r.min_in_person.unwrap_or(0);
        if min_needed == 0 {
            return Ok(0);
        }
        if min_needed > r.max_classes {
            return Err(PlaceFailure::Fatal(PlanError::Scheduling(format!(
                "minimum in-person count {min_needed} exceeds max class size {}",
                r.max_classes
            ))));
        }

        let eligible: Vec<String> = qualified
            .iter()
            .filter(|id| r.is_in_person(id))
            .cloned()
            .collect();
        if eligible.len() < min_needed {
            return Err(PlaceFailure::Fatal(PlanError::Scheduling(format!(
                "session {}: {min_needed} in-person courses required before {cutoff}, only {} eligible",
                session.number,
                eligible.len()
            ))));
        }

        for id in eligible.into_iter().take(min_needed) {
            qualified.retain(|q| q != &id);
            remaining.retain(|q| q != &id);
            Self::add_by_id(user, session, &id)?;
        }
        Ok(min_needed)
    }

    /// Commit a level's leftover pre-assigned sessions when no pool courses
    /// remain to fill them: finalize the ledger charge and move them to the
    /// schedule as they stand.
    fn commit_preassigned(&self, user: &mut User, sessions: &[Session]) -> Result<()> {
        for session in sessions {
            let mut session = match user.take_free_session(session.number) {
                Some(s) => s,
                None => continue,
            };

            let grants_applied = round_cents(user.grants_per_session.min(session.gross_cost()));
            let net = round_cents(session.gross_cost() - grants_applied);
            let mut benefit_applied = 0.0;

            if let Some(ledger) = user.ledger.as_mut() {
                let preview = ledger.simulate_charge(&session, net);
                if !preview.covered && !self.restraints.exceed_benefits {
                    let number = session.number;
                    // Session stays free; the error surfaces before commit
                    user.free_sessions.push(session);
                    user.free_sessions.sort();
                    return Err(PlanError::Scheduling(format!(
                        "pre-assigned session {number} exceeds available benefits"
                    )));
                }
                if let Some(outcome) = ledger.commit_charge(&session, net) {
                    benefit_applied = outcome.benefit_applied;
                }
            }

            session.apply_aid(grants_applied, benefit_applied)?;
            user.schedule.push(session);
        }
        user.schedule.sort();
        Ok(())
    }

    /// Apply grants, then simulate and finalize the ledger charge, enforcing
    /// the benefit and session-cost restraints.
    fn charge_session(
        &self,
        user: &User,
        session: &mut Session,
        ledger: Option<&mut BenefitLedger>,
        session_index: usize,
    ) -> PlaceResult<()> {
        let r = self.restraints;
        let grants_applied = round_cents(user.grants_per_session.min(session.gross_cost()));
        let net = round_cents(session.gross_cost() - grants_applied);

        let (benefit_applied, learner_cost) = if let Some(ledger) = ledger {
            let preview = ledger.simulate_charge(session, net);
            if !preview.covered && !r.exceed_benefits {
                return Err(PlaceFailure::Fatal(PlanError::Scheduling(format!(
                    "session {} exceeds available benefits",
                    session.number
                ))));
            }
            if let Some(ceiling) = r.max_session_cost {
                if preview.learner_cost > ceiling {
                    return Err(PlaceFailure::Cost {
                        session_index,
                        error: PlanError::Scheduling(format!(
                            "session {}: learner cost {:.2} exceeds ceiling {ceiling:.2}",
                            session.number, preview.learner_cost
                        )),
                    });
                }
            }
            let outcome = ledger.commit_charge(session, net).unwrap_or(preview);
            (outcome.benefit_applied, outcome.learner_cost)
        } else {
            if let Some(ceiling) = r.max_session_cost {
                if net > ceiling {
                    return Err(PlaceFailure::Cost {
                        session_index,
                        error: PlanError::Scheduling(format!(
                            "session {}: learner cost {net:.2} exceeds ceiling {ceiling:.2}",
                            session.number
                        )),
                    });
                }
            }
            (0.0, net)
        };

        debug!(
            "Session {} charged: learner pays {learner_cost:.2}",
            session.number
        );
        session
            .apply_aid(grants_applied, benefit_applied)
            .map_err(PlaceFailure::Fatal)
    }

    /// Commit a validated level placement into the learner aggregate.
    fn commit_level(user: &mut User, outcome: LevelOutcome) {
        for session in outcome.sessions {
            for id in session.courses().to_vec() {
                user.mark_satisfied(id);
            }
            let _ = user.take_free_session(session.number);
            user.schedule.push(session);
        }
        user.schedule.sort();
        if outcome.ledger.is_some() {
            user.ledger = outcome.ledger;
        }
    }

    /// Phase 4: attach intent courses ahead of the sessions that depend on
    /// them, then spread the leftovers round-robin over future sessions.
    fn place_intents(&self, user: &mut User) -> Result<()> {
        let mut remaining: Vec<String> = user
            .courses
            .iter()
            .filter(|c| c.is_intent())
            .map(|c| c.id.clone())
            .collect();
        if remaining.is_empty() {
            return Ok(());
        }

        user.schedule.sort();

        // A dependency must logically precede the session that needs it
        for i in 1..user.schedule.len() {
            if remaining.is_empty() {
                break;
            }
            let matched: Vec<String> = user.schedule[i]
                .courses()
                .iter()
                .filter_map(|cid| user.course(cid))
                .flat_map(|c| c.prereqs.iter())
                .flat_map(Requirement::course_ids)
                .filter(|pid| remaining.iter().any(|r| r == pid))
                .map(ToString::to_string)
                .collect();

            for id in matched {
                if let Some(pos) = remaining.iter().position(|r| r == &id) {
                    remaining.remove(pos);
                    user.schedule[i - 1].add_intent(id);
                }
            }
        }

        let as_of = user.as_of;
        let future: Vec<usize> = user
            .schedule
            .iter()
            .enumerate()
            .filter(|(_, s)| s.start_date > as_of)
            .map(|(i, _)| i)
            .collect();

        let mut rounds = 0;
        while !remaining.is_empty() {
            rounds += 1;
            if rounds > self.settings.intent_spread_rounds {
                return Err(PlanError::Scheduling(format!(
                    "unable to attach intent courses to any session: {remaining:?}"
                )));
            }
            for &i in &future {
                if remaining.is_empty() {
                    break;
                }
                let id = remaining.remove(0);
                user.schedule[i].add_intent(id);
            }
        }
        Ok(())
    }

    /// Whether every AND term is satisfied and every OR group has at least
    /// one satisfied member. Ids missing from the catalog count as satisfied
    /// (cross-catalog or already-verified prerequisites).
    fn prereqs_met(user: &User, id: &str, satisfied: &[String]) -> bool {
        let Some(course) = user.course(id) else {
            return false;
        };
        course.prereqs.iter().all(|term| match term {
            Requirement::Course(p) => {
                satisfied.iter().any(|s| s == p) || user.course(p).is_none()
            }
            Requirement::AnyOf(alts) => alts
                .iter()
                .any(|p| satisfied.iter().any(|s| s == p) || user.course(p).is_none()),
        })
    }

    fn add_by_id(user: &User, session: &mut Session, id: &str) -> PlaceResult<()> {
        let course = user.course(id).ok_or_else(|| {
            PlaceFailure::Fatal(PlanError::DataIntegrity(format!("unknown course id '{id}'")))
        })?;
        session.add_course(course).map_err(PlaceFailure::Fatal)
    }
}
