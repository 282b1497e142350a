//! Session calendar generation
//!
//! Emits ordered, holiday-rounded session placeholders from a target start
//! date and the recurring anchor months, with per-level tagging and a cap
//! against remaining benefit days.

pub mod holidays;

use crate::core::config::PlannerSettings;
use crate::core::errors::{PlanError, Result};
use crate::core::models::{Level, Restraints, Session, User};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
pub use holidays::dates_around;

/// Snap a target date to the nearest occurrence of `weekday` inside a ±7-day
/// window.
///
/// Candidates falling within 2 days before or 1 day after a holiday are
/// skipped, but only while still inside the window; when every in-window
/// candidate is blocked, holidays are ignored and the nearest wins. Ties
/// between equally-near candidates resolve to the earlier date.
#[must_use]
pub fn round_to_weekday(
    target: NaiveDate,
    weekday: Weekday,
    holiday_dates: &[NaiveDate],
) -> NaiveDate {
    let mut candidates: Vec<NaiveDate> = (-7..=7)
        .map(|offset| target + Duration::days(offset))
        .filter(|d| d.weekday() == weekday)
        .collect();
    candidates.sort_by_key(|d| ((*d - target).num_days().abs(), *d));

    candidates
        .iter()
        .copied()
        .find(|c| !near_holiday(*c, holiday_dates))
        .or_else(|| candidates.first().copied())
        .unwrap_or(target)
}

fn near_holiday(candidate: NaiveDate, holiday_dates: &[NaiveDate]) -> bool {
    holiday_dates.iter().any(|&h| {
        candidate >= h - Duration::days(2) && candidate <= h + Duration::days(1)
    })
}

/// Holiday-rounded start date of the `n`th session (1-based) counted from
/// the first-session target date along the anchor months.
///
/// # Errors
/// Returns [`PlanError::DataIntegrity`] when the first-session month is not
/// an anchor month.
pub fn anchor_start(settings: &PlannerSettings, first: NaiveDate, n: u32) -> Result<NaiveDate> {
    let months = &settings.sessions.months;
    let mut index = anchor_index(months, first)?;
    let mut year = first.year();

    for _ in 1..n {
        index += 1;
        if index >= months.len() {
            index = 0;
            year += 1;
        }
    }

    let target = month_start(year, months[index])?;
    let holiday_dates = holidays::dates_around(&settings.sessions.holidays, target);
    Ok(round_to_weekday(
        target,
        settings.sessions.start_weekday,
        &holiday_dates,
    ))
}

/// Generate the free-session placeholders for one learner.
///
/// Session numbers index the anchor walk from the first-session date, so a
/// session's number always determines its start date. Per-level counts come
/// from placeable course counts and the minimum class size (or a fixed
/// `spread_between`), net of pre-assigned future sessions that can still
/// take courses, undergraduate block first. When a benefit ledger is
/// attached and the plan needs more sessions than the remaining entitlement
/// days afford, counts are capped proportionally per level; when exceeding
/// benefits is forbidden this fails instead. Anchor slots whose
/// numbers are already taken (no duplicate numbering) or whose dates lie in
/// the past are skipped.
///
/// # Errors
/// Returns [`PlanError::Scheduling`] when the plan would exceed benefits and
/// the restraints forbid it, or [`PlanError::DataIntegrity`] for a
/// first-session month outside the anchor list.
pub fn create_sessions(
    user: &User,
    restraints: &Restraints,
    settings: &PlannerSettings,
) -> Result<Vec<Session>> {
    let under_count = user.placeable_count(Level::Undergraduate);
    let grad_count = user.placeable_count(Level::Graduate);

    let (mut under_sessions, mut grad_sessions) = restraints.spread_between.map_or_else(
        || {
            (
                ceil_div(under_count, restraints.min_classes),
                ceil_div(grad_count, restraints.min_classes),
            )
        },
        |total| split_proportionally(total, under_count, grad_count),
    );

    // Pre-assigned future sessions can still take courses; only the
    // remainder needs new placeholders
    let spare = |level: Level| {
        user.free_sessions
            .iter()
            .filter(|s| s.level == level && s.start_date >= user.as_of)
            .count()
    };
    under_sessions = under_sessions.saturating_sub(spare(Level::Undergraduate));
    grad_sessions = grad_sessions.saturating_sub(spare(Level::Graduate));

    if let Some(ledger) = &user.ledger {
        let session_days = settings.sessions.duration_days();
        let affordable = usize::try_from(ledger.remaining_days() / session_days.max(1))
            .unwrap_or(0);
        let total = under_sessions + grad_sessions;

        if total > affordable {
            if !restraints.exceed_benefits {
                return Err(PlanError::Scheduling(format!(
                    "schedule needs {total} sessions but benefits cover only {affordable}"
                )));
            }

            // Reduce proportionally per level, keeping at least one session
            // for any level that has courses
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            if total > 0 {
                let under_ratio = under_sessions as f64 / total as f64;
                let grad_ratio = grad_sessions as f64 / total as f64;
                under_sessions = (affordable as f64 * under_ratio) as usize;
                grad_sessions = (affordable as f64 * grad_ratio) as usize;
            }
            if under_count > 0 {
                under_sessions = under_sessions.max(1);
            }
            if grad_count > 0 {
                grad_sessions = grad_sessions.max(1);
            }
        }
    }

    let months = &settings.sessions.months;
    let mut index = anchor_index(months, user.first_session_date)?;
    let mut year = user.first_session_date.year();
    let mut number = 1u32;
    let mut sessions = Vec::with_capacity(under_sessions + grad_sessions);

    for (level, count) in [
        (Level::Undergraduate, under_sessions),
        (Level::Graduate, grad_sessions),
    ] {
        let mut remaining = count;
        while remaining > 0 {
            let target = month_start(year, months[index])?;
            let holiday_dates = holidays::dates_around(&settings.sessions.holidays, target);
            let start = round_to_weekday(target, settings.sessions.start_weekday, &holiday_dates);

            let slot_number = number;
            number += 1;
            index += 1;
            if index >= months.len() {
                index = 0;
                year += 1;
            }

            // Numbers already claimed by fixed sessions, and slots in the
            // past, are not available
            if user.has_session(slot_number) || start < user.as_of {
                continue;
            }

            sessions.push(Session::new(
                slot_number,
                start,
                level,
                settings.sessions.weeks,
                settings.costs.per_session_fee,
            ));
            remaining -= 1;
        }
    }

    sessions.sort_by_key(|s| s.start_date);
    Ok(sessions)
}

fn anchor_index(months: &[u32], first: NaiveDate) -> Result<usize> {
    months
        .iter()
        .position(|&m| m == first.month())
        .ok_or_else(|| {
            PlanError::DataIntegrity(format!(
                "first session month {} is not an anchor month {months:?}",
                first.month()
            ))
        })
}

fn month_start(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        PlanError::DataIntegrity(format!("invalid session month: {year}-{month}"))
    })
}

fn ceil_div(count: usize, divisor: usize) -> usize {
    if divisor == 0 {
        0
    } else {
        count.div_ceil(divisor)
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn split_proportionally(total: usize, under_count: usize, grad_count: usize) -> (usize, usize) {
    let course_total = under_count + grad_count;
    if course_total == 0 {
        return (0, 0);
    }
    let under = ((total as f64) * (under_count as f64 / course_total as f64)).round() as usize;
    (under, total - under.min(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, PlannerSettings};
    use crate::core::ledger::BenefitLedger;
    use crate::core::models::{Course, Requirement, Status};
    use holidays::HolidayRule;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings() -> PlannerSettings {
        PlannerSettings::from_config(&Config::from_defaults()).unwrap()
    }

    fn all_holidays(around: NaiveDate) -> Vec<NaiveDate> {
        let rules: Vec<HolidayRule> = HolidayRule::known_names()
            .iter()
            .filter_map(|n| HolidayRule::from_name(n))
            .collect();
        dates_around(&rules, around)
    }

    fn course(id: &str, level: Level) -> Course {
        Course::new(
            id.to_string(),
            3,
            Status::None,
            level,
            Vec::<Requirement>::new(),
            false,
            None,
            false,
            false,
            &settings().costs,
        )
        .unwrap()
    }

    fn user_with(courses: Vec<Course>, ledger: Option<BenefitLedger>) -> User {
        User::new(
            "learner-1".to_string(),
            date(2025, 9, 1),
            date(2025, 6, 1),
            courses,
            0.0,
            ledger,
        )
    }

    #[test]
    fn test_round_skips_labor_day_weekend() {
        // Sep 1, 2025 is Labor Day; nearest Sunday Aug 31 is blocked
        let result = round_to_weekday(date(2025, 9, 1), Weekday::Sun, &all_holidays(date(2025, 9, 1)));
        assert_eq!(result, date(2025, 9, 7));
    }

    #[test]
    fn test_round_plain_nearest() {
        let result = round_to_weekday(date(2025, 9, 10), Weekday::Sun, &all_holidays(date(2025, 9, 10)));
        assert_eq!(result, date(2025, 9, 7));
    }

    #[test]
    fn test_round_early_month() {
        let result = round_to_weekday(date(2025, 9, 2), Weekday::Sun, &all_holidays(date(2025, 9, 2)));
        assert_eq!(result, date(2025, 9, 7));
    }

    #[test]
    fn test_round_exact_match_wins() {
        let result = round_to_weekday(date(2025, 6, 8), Weekday::Sun, &[]);
        assert_eq!(result, date(2025, 6, 8));

        let result = round_to_weekday(date(2025, 6, 9), Weekday::Sun, &[]);
        assert_eq!(result, date(2025, 6, 8));
    }

    #[test]
    fn test_round_tie_prefers_earlier() {
        // Target is itself a Sunday but holiday-blocked; Jun 1 and Jun 15
        // are both exactly 7 days out, so the earlier date wins
        let result = round_to_weekday(date(2025, 6, 8), Weekday::Sun, &[date(2025, 6, 9)]);
        assert_eq!(result, date(2025, 6, 1));
    }

    #[test]
    fn test_round_all_blocked_falls_back_to_nearest() {
        // Every Sunday near the target marked as a holiday
        let blocked = vec![date(2025, 8, 31), date(2025, 9, 7)];
        let result = round_to_weekday(date(2025, 9, 1), Weekday::Sun, &blocked);
        assert_eq!(result, date(2025, 8, 31));
    }

    #[test]
    fn test_create_sessions_counts_and_levels() {
        // 4 undergrad + 2 grad, min class 2 -> 2 + 1 sessions
        let courses = vec![
            course("U1", Level::Undergraduate),
            course("U2", Level::Undergraduate),
            course("U3", Level::Undergraduate),
            course("U4", Level::Undergraduate),
            course("G1", Level::Graduate),
            course("G2", Level::Graduate),
        ];
        let user = user_with(courses, None);
        let sessions = create_sessions(&user, &Restraints::default(), &settings()).unwrap();

        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].level, Level::Undergraduate);
        assert_eq!(sessions[1].level, Level::Undergraduate);
        assert_eq!(sessions[2].level, Level::Graduate);
        assert_eq!(
            sessions.iter().map(|s| s.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        // Chronological and anchored: Sep, Nov, Jan
        assert!(sessions[0].start_date < sessions[1].start_date);
        assert!(sessions[1].start_date < sessions[2].start_date);
        assert_eq!(sessions[0].start_date, date(2025, 9, 7));
    }

    #[test]
    fn test_create_sessions_benefit_cap_forbidden() {
        // 112 entitlement days cover exactly 2 sessions; 3 needed
        let ledger =
            BenefitLedger::new(12_000.0, (8, 1), (3, 22), date(2025, 6, 1)).unwrap();
        let courses = vec![
            course("U1", Level::Undergraduate),
            course("U2", Level::Undergraduate),
            course("U3", Level::Undergraduate),
            course("U4", Level::Undergraduate),
            course("G1", Level::Graduate),
            course("G2", Level::Graduate),
        ];
        let user = user_with(courses, Some(ledger));

        let result = create_sessions(&user, &Restraints::default(), &settings());
        assert!(matches!(result, Err(PlanError::Scheduling(_))));
    }

    #[test]
    fn test_create_sessions_benefit_cap_allowed() {
        let ledger =
            BenefitLedger::new(12_000.0, (8, 1), (3, 22), date(2025, 6, 1)).unwrap();
        let courses = vec![
            course("U1", Level::Undergraduate),
            course("U2", Level::Undergraduate),
            course("U3", Level::Undergraduate),
            course("U4", Level::Undergraduate),
            course("G1", Level::Graduate),
            course("G2", Level::Graduate),
        ];
        let user = user_with(courses, Some(ledger));
        let restraints = Restraints {
            exceed_benefits: true,
            ..Restraints::default()
        };

        let sessions = create_sessions(&user, &restraints, &settings()).unwrap();
        // Capped to what benefits afford, one per non-empty level minimum
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].level, Level::Undergraduate);
        assert_eq!(sessions[1].level, Level::Graduate);
    }

    #[test]
    fn test_create_sessions_drops_committed_numbers() {
        let courses = vec![
            course("U1", Level::Undergraduate),
            course("U2", Level::Undergraduate),
        ];
        let mut user = user_with(courses, None);
        user.schedule.push(Session::new(
            1,
            date(2025, 9, 7),
            Level::Undergraduate,
            8,
            40.0,
        ));

        let sessions = create_sessions(&user, &Restraints::default(), &settings()).unwrap();
        assert!(sessions.iter().all(|s| s.number != 1));
    }

    #[test]
    fn test_create_sessions_bad_first_month() {
        let courses = vec![course("U1", Level::Undergraduate)];
        let mut user = user_with(courses, None);
        user.first_session_date = date(2025, 8, 1); // August is not an anchor

        let result = create_sessions(&user, &Restraints::default(), &settings());
        assert!(matches!(result, Err(PlanError::DataIntegrity(_))));
    }

    #[test]
    fn test_anchor_start_walks_and_wraps() {
        let s = settings();
        let first = date(2025, 9, 1);
        // n=1 is the first session itself
        assert_eq!(anchor_start(&s, first, 1).unwrap(), date(2025, 9, 7));
        // n=3 wraps into January 2026 (anchors 9, 11, 1)
        let third = anchor_start(&s, first, 3).unwrap();
        assert_eq!(third.month(), 1);
        assert_eq!(third.year(), 2026);
    }
}
