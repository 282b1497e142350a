//! Per-session course-count target distribution
//!
//! Produces front-loaded integer targets and the bounded adjustment
//! candidates the engine backtracks through when a session fails its cost
//! checks.

use crate::core::errors::{PlanError, Result};

/// Compute the per-session course-count targets for one level.
///
/// The list sums exactly to `n_courses`, every entry stays within
/// `[min_per_session, max_per_session]`, and earlier sessions carry
/// equal-or-larger loads (front-loaded, non-increasing).
///
/// # Errors
/// Returns [`PlanError::Scheduling`] when the course count cannot fit the
/// session count under the class-size bounds.
pub fn distribute(
    n_courses: usize,
    n_sessions: usize,
    min_per_session: usize,
    max_per_session: usize,
) -> Result<Vec<usize>> {
    if n_sessions == 0 {
        return Err(PlanError::Scheduling(format!(
            "no sessions available for {n_courses} courses"
        )));
    }
    if min_per_session > max_per_session {
        return Err(PlanError::Scheduling(format!(
            "min class size {min_per_session} exceeds max {max_per_session}"
        )));
    }
    if n_courses < n_sessions * min_per_session {
        return Err(PlanError::Scheduling(format!(
            "too few courses ({n_courses}) to meet the minimum of {min_per_session} across {n_sessions} sessions"
        )));
    }
    if n_courses > n_sessions * max_per_session {
        return Err(PlanError::Scheduling(format!(
            "too many courses ({n_courses}) to stay under the maximum of {max_per_session} across {n_sessions} sessions"
        )));
    }

    let base = n_courses / n_sessions;
    let remainder = n_courses % n_sessions;

    // Front-load the remainder; base + 1 cannot exceed the max or the
    // feasibility check above would have failed
    let targets = (0..n_sessions)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect();

    Ok(targets)
}

/// Produce the next backtracking candidate by shifting one course out of the
/// session at `index` into the nearest session with spare capacity, later
/// sessions preferred.
///
/// Returns `None` when the session already sits at the minimum or no other
/// session can absorb the course.
#[must_use]
pub fn shift_load(
    targets: &[usize],
    index: usize,
    min_per_session: usize,
    max_per_session: usize,
) -> Option<Vec<usize>> {
    if index >= targets.len() || targets[index] <= min_per_session {
        return None;
    }

    let after = (index + 1..targets.len()).find(|&i| targets[i] < max_per_session);
    let before = (0..index).rev().find(|&i| targets[i] < max_per_session);

    let recipient = after.or(before)?;

    let mut adjusted = targets.to_vec();
    adjusted[index] -= 1;
    adjusted[recipient] += 1;
    Some(adjusted)
}
