//! Benefit ledger (GI Bill-style aid tracker)
//!
//! Tracks remaining entitlement as a day count plus dollar-denominated
//! benefit-year buckets keyed by their start date. Charges come in two
//! modes: `simulate_charge` works on a value copy and never mutates,
//! `commit_charge` applies the deduction and records the session number so
//! the same session is never charged twice.

use crate::core::config::round_cents;
use crate::core::errors::{PlanError, Result};
use crate::core::models::Session;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One 12-month dollar bucket of aid, reset annually on the anniversary date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitYear {
    /// First day of the benefit year.
    pub start: NaiveDate,
    /// Last day of the benefit year (inclusive).
    pub end: NaiveDate,
    /// Dollars left in the bucket.
    pub remaining: f64,
}

/// Result of charging (or simulating a charge for) one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeOutcome {
    /// Whether at least one entitlement day remained for this session.
    pub covered: bool,
    /// Dollars drawn from the matching benefit-year bucket.
    pub benefit_applied: f64,
    /// Net cost left to the learner after the charge.
    pub learner_cost: f64,
    /// Entitlement days remaining after the charge.
    pub days_remaining: i64,
}

/// Per-learner entitlement ledger.
///
/// Constructed once with a known as-of baseline, retroactively charged for
/// historical sessions via [`BenefitLedger::charge_historical`], then charged
/// incrementally as future sessions are finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenefitLedger {
    yearly_amount: f64,
    anniversary_month: u32,
    anniversary_day: u32,
    remaining_days: i64,
    as_of: NaiveDate,
    years: BTreeMap<NaiveDate, BenefitYear>,
    charged: BTreeSet<u32>,
}

impl BenefitLedger {
    /// Create a ledger.
    ///
    /// # Arguments
    /// * `yearly_amount` - Dollar allotment of each benefit year
    /// * `anniversary` - (month, day) the benefit year resets on
    /// * `remaining_time` - (months, days) of entitlement left as of `as_of`
    /// * `as_of` - Date the remaining entitlement was measured
    ///
    /// # Errors
    /// Returns [`PlanError::DataIntegrity`] for a negative allotment or an
    /// anniversary that does not exist in every year (e.g. Feb 29).
    pub fn new(
        yearly_amount: f64,
        anniversary: (u32, u32),
        remaining_time: (u32, u32),
        as_of: NaiveDate,
    ) -> Result<Self> {
        if yearly_amount < 0.0 {
            return Err(PlanError::DataIntegrity(format!(
                "yearly benefit amount cannot be negative: {yearly_amount}"
            )));
        }
        let (month, day) = anniversary;
        // Validate against a non-leap year so the anniversary exists every year
        if NaiveDate::from_ymd_opt(2001, month, day).is_none() {
            return Err(PlanError::DataIntegrity(format!(
                "invalid benefit anniversary: month {month}, day {day}"
            )));
        }

        let (months_left, days_left) = remaining_time;
        let remaining_days = i64::from(months_left) * 30 + i64::from(days_left);

        let mut ledger = Self {
            yearly_amount,
            anniversary_month: month,
            anniversary_day: day,
            remaining_days,
            as_of,
            years: BTreeMap::new(),
            charged: BTreeSet::new(),
        };

        // Seed the bucket containing the as-of date
        let start = ledger.bucket_start(as_of);
        ledger.years.insert(
            start,
            BenefitYear {
                start,
                end: year_after(start) - Duration::days(1),
                remaining: yearly_amount,
            },
        );

        Ok(ledger)
    }

    /// Entitlement days remaining.
    #[must_use]
    pub const fn remaining_days(&self) -> i64 {
        self.remaining_days
    }

    /// Date the entitlement baseline was measured.
    #[must_use]
    pub const fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Dollars remaining in the bucket whose range contains `date`, if that
    /// bucket has been opened.
    #[must_use]
    pub fn year_remaining(&self, date: NaiveDate) -> Option<f64> {
        self.years.get(&self.bucket_start(date)).map(|y| y.remaining)
    }

    /// Whether a session number has already received a final charge.
    #[must_use]
    pub fn is_charged(&self, session_number: u32) -> bool {
        self.charged.contains(&session_number)
    }

    /// Simulate charging a session without mutating any ledger state.
    ///
    /// `net_cost` is the session cost net of grants.
    #[must_use]
    pub fn simulate_charge(&self, session: &Session, net_cost: f64) -> ChargeOutcome {
        let mut copy = self.clone();
        copy.apply_charge(session, net_cost)
    }

    /// Apply a final charge for a session. Returns `None` when the session
    /// number was already charged (state untouched).
    pub fn commit_charge(&mut self, session: &Session, net_cost: f64) -> Option<ChargeOutcome> {
        if self.charged.contains(&session.number) {
            return None;
        }
        let outcome = self.apply_charge(session, net_cost);
        self.charged.insert(session.number);
        Some(outcome)
    }

    /// One-time catch-up: final-charge every session that has already started
    /// or completed, in start-date order. Idempotent; sessions already
    /// charged (by number) are skipped.
    pub fn charge_historical(&mut self, sessions: &[&Session], grants_per_session: f64) {
        let mut historical: Vec<&Session> = sessions
            .iter()
            .copied()
            .filter(|s| s.start_date <= self.as_of)
            .collect();
        historical.sort_by_key(|s| s.start_date);

        for session in historical {
            let net = round_cents((session.gross_cost() - grants_per_session).max(0.0));
            self.commit_charge(session, net);
        }
    }

    /// Day and dollar deduction for one session.
    ///
    /// Day coverage is all-or-nothing in whole-session units; dollar coverage
    /// is capped at the matching bucket's remaining balance. Sessions that
    /// ended before the as-of date never consume days (the baseline already
    /// reflects them) but still draw dollars.
    fn apply_charge(&mut self, session: &Session, net_cost: f64) -> ChargeOutcome {
        let covered = if session.end_date < self.as_of {
            true
        } else {
            let covered = self.remaining_days > 0;
            if covered {
                self.remaining_days -= session.duration_days();
            }
            covered
        };

        let mut benefit_applied = 0.0;
        if covered {
            let start = self.bucket_start(session.start_date);
            let end = year_after(start) - Duration::days(1);
            let yearly_amount = self.yearly_amount;
            let year = self.years.entry(start).or_insert(BenefitYear {
                start,
                end,
                remaining: yearly_amount,
            });

            benefit_applied = round_cents(net_cost.min(year.remaining.max(0.0)));
            year.remaining = round_cents(year.remaining - benefit_applied);
        }

        ChargeOutcome {
            covered,
            benefit_applied,
            learner_cost: round_cents(net_cost - benefit_applied),
            days_remaining: self.remaining_days,
        }
    }

    /// Start of the benefit year whose range contains `date`.
    fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        let this_year = self.anniversary_in(date.year());
        if date < this_year {
            self.anniversary_in(date.year() - 1)
        } else {
            this_year
        }
    }

    fn anniversary_in(&self, year: i32) -> NaiveDate {
        // Anniversary validated at construction; the fallback is unreachable
        NaiveDate::from_ymd_opt(year, self.anniversary_month, self.anniversary_day)
            .unwrap_or_default()
    }
}

/// Same calendar date one year later (Feb 29 degrades to +365 days).
fn year_after(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() + 1, date.month(), date.day())
        .unwrap_or_else(|| date + Duration::days(365))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Course, Level, Session, Status};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rates() -> crate::core::config::CostRates {
        crate::core::config::CostRates {
            per_credit_undergrad: 500.0,
            per_credit_grad: 700.0,
            per_course_fee: 100.0,
            per_session_fee: 40.0,
            alumni_discount_percent: 20.0,
        }
    }

    fn session_with_cost(number: u32, start: NaiveDate) -> Session {
        // One 3-credit undergrad course: 3*500 + 100 = 1600; gross = 1640
        let course = Course::new(
            format!("C{number}"),
            3,
            Status::None,
            Level::Undergraduate,
            Vec::new(),
            false,
            None,
            false,
            false,
            &rates(),
        )
        .unwrap();
        let mut session = Session::new(number, start, Level::Undergraduate, 8, 40.0);
        session.add_course(&course).unwrap();
        session
    }

    fn ledger() -> BenefitLedger {
        BenefitLedger::new(12_000.0, (8, 1), (16, 20), date(2025, 6, 1)).unwrap()
    }

    #[test]
    fn test_new_seeds_active_bucket() {
        let ledger = ledger();
        assert_eq!(ledger.remaining_days(), 16 * 30 + 20);
        // June 2025 falls in the bucket starting Aug 1, 2024
        assert_eq!(ledger.year_remaining(date(2025, 6, 1)), Some(12_000.0));
    }

    #[test]
    fn test_invalid_anniversary_rejected() {
        let result = BenefitLedger::new(1000.0, (2, 29), (1, 0), date(2025, 1, 1));
        assert!(matches!(result, Err(PlanError::DataIntegrity(_))));
    }

    #[test]
    fn test_covered_session_charges_days_and_dollars() {
        let mut ledger = BenefitLedger::new(12_000.0, (8, 1), (16, 20), date(2025, 6, 1)).unwrap();
        let session = session_with_cost(1, date(2025, 7, 6));
        let days_before = ledger.remaining_days();

        let outcome = ledger.commit_charge(&session, 1640.0).unwrap();
        assert!(outcome.covered);
        assert!((outcome.benefit_applied - 1640.0).abs() < 1e-9);
        assert!(outcome.learner_cost.abs() < 1e-9);
        assert_eq!(ledger.remaining_days(), days_before - 56);
    }

    #[test]
    fn test_covered_learner_cost_below_gross() {
        // 500 remaining days, one 56-day future session cheaper than the bucket
        let mut ledger = BenefitLedger::new(12_000.0, (8, 1), (16, 20), date(2025, 6, 1)).unwrap();
        let session = session_with_cost(1, date(2025, 9, 7));

        let outcome = ledger.commit_charge(&session, 1640.0).unwrap();
        assert!(outcome.covered);
        assert!(outcome.learner_cost < session.gross_cost());
    }

    #[test]
    fn test_uncovered_session_owes_full_net_cost() {
        let mut ledger = BenefitLedger::new(12_000.0, (8, 1), (0, 0), date(2025, 6, 1)).unwrap();
        let session = session_with_cost(1, date(2025, 7, 6));

        let outcome = ledger.commit_charge(&session, 1640.0).unwrap();
        assert!(!outcome.covered);
        assert!((outcome.learner_cost - 1640.0).abs() < 1e-9);
        assert!(outcome.benefit_applied.abs() < 1e-9);
    }

    #[test]
    fn test_dollar_coverage_capped_at_bucket() {
        let mut ledger = BenefitLedger::new(1000.0, (8, 1), (16, 20), date(2025, 6, 1)).unwrap();
        let session = session_with_cost(1, date(2025, 7, 6));

        let outcome = ledger.commit_charge(&session, 1640.0).unwrap();
        assert!(outcome.covered);
        assert!((outcome.benefit_applied - 1000.0).abs() < 1e-9);
        assert!((outcome.learner_cost - 640.0).abs() < 1e-9);
        assert_eq!(ledger.year_remaining(date(2025, 7, 6)), Some(0.0));
    }

    #[test]
    fn test_simulate_does_not_mutate() {
        let ledger = ledger();
        let session = session_with_cost(1, date(2025, 7, 6));
        let before = ledger.clone();

        let outcome = ledger.simulate_charge(&session, 1640.0);
        assert!(outcome.covered);
        assert_eq!(ledger.remaining_days(), before.remaining_days());
        assert_eq!(
            ledger.year_remaining(date(2025, 7, 6)),
            before.year_remaining(date(2025, 7, 6))
        );
    }

    #[test]
    fn test_commit_is_idempotent_per_session() {
        let mut ledger = ledger();
        let session = session_with_cost(1, date(2025, 7, 6));

        assert!(ledger.commit_charge(&session, 1640.0).is_some());
        assert!(ledger.commit_charge(&session, 1640.0).is_none());
        assert!(ledger.is_charged(1));
    }

    #[test]
    fn test_charge_historical_idempotent() {
        let mut ledger = ledger();
        let s1 = session_with_cost(1, date(2025, 1, 5));
        let s2 = session_with_cost(2, date(2025, 3, 2));

        ledger.charge_historical(&[&s1, &s2], 0.0);
        let days_after = ledger.remaining_days();
        let dollars_after = ledger.year_remaining(date(2025, 3, 2));

        ledger.charge_historical(&[&s1, &s2], 0.0);
        assert_eq!(ledger.remaining_days(), days_after);
        assert_eq!(ledger.year_remaining(date(2025, 3, 2)), dollars_after);
    }

    #[test]
    fn test_historical_skips_future_sessions() {
        let mut ledger = ledger();
        let future = session_with_cost(9, date(2026, 1, 4));

        ledger.charge_historical(&[&future], 0.0);
        assert!(!ledger.is_charged(9));
        assert_eq!(ledger.remaining_days(), 16 * 30 + 20);
    }

    #[test]
    fn test_session_ended_before_asof_keeps_days() {
        // Ended 2025-03-02 + 56d = 2025-04-27, before as-of 2025-06-01
        let mut ledger = ledger();
        let past = session_with_cost(1, date(2025, 3, 2));
        let days_before = ledger.remaining_days();

        let outcome = ledger.commit_charge(&past, 1640.0).unwrap();
        assert!(outcome.covered);
        assert_eq!(ledger.remaining_days(), days_before);
        // Dollars still drawn
        assert!((outcome.benefit_applied - 1640.0).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_rollover_before_anniversary() {
        let ledger = ledger();
        // July 2025 is before the Aug 1 anniversary: prior year's bucket
        let start = ledger.bucket_start(date(2025, 7, 15));
        assert_eq!(start, date(2024, 8, 1));
        // On/after the anniversary: this year's bucket
        let start = ledger.bucket_start(date(2025, 8, 1));
        assert_eq!(start, date(2025, 8, 1));
    }
}
