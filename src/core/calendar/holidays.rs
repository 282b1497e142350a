//! Holiday rules
//!
//! Holidays are computed per calendar year from fixed rules: fixed dates,
//! "nth weekday of month", and "last weekday of month".

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One holiday rule, evaluated per calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolidayRule {
    /// Same month/day every year (e.g. July 4).
    Fixed {
        /// Month 1-12.
        month: u32,
        /// Day of month.
        day: u32,
    },
    /// Nth occurrence of a weekday in a month (e.g. 4th Thursday of November).
    NthWeekday {
        /// Month 1-12.
        month: u32,
        /// Weekday to count.
        weekday: Weekday,
        /// 1-based occurrence.
        nth: u32,
    },
    /// Last occurrence of a weekday in a month (e.g. last Monday of May).
    LastWeekday {
        /// Month 1-12.
        month: u32,
        /// Weekday to find.
        weekday: Weekday,
    },
}

impl HolidayRule {
    /// Names accepted by [`HolidayRule::from_name`].
    #[must_use]
    pub const fn known_names() -> &'static [&'static str] {
        &[
            "new_year",
            "mlk_day",
            "presidents_day",
            "memorial_day",
            "juneteenth",
            "independence_day",
            "labor_day",
            "columbus_day",
            "veterans_day",
            "thanksgiving",
            "christmas",
        ]
    }

    /// Resolve a named federal holiday to its rule.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "new_year" => Some(Self::Fixed { month: 1, day: 1 }),
            "mlk_day" => Some(Self::NthWeekday {
                month: 1,
                weekday: Weekday::Mon,
                nth: 3,
            }),
            "presidents_day" => Some(Self::NthWeekday {
                month: 2,
                weekday: Weekday::Mon,
                nth: 3,
            }),
            "memorial_day" => Some(Self::LastWeekday {
                month: 5,
                weekday: Weekday::Mon,
            }),
            "juneteenth" => Some(Self::Fixed { month: 6, day: 19 }),
            "independence_day" => Some(Self::Fixed { month: 7, day: 4 }),
            "labor_day" => Some(Self::NthWeekday {
                month: 9,
                weekday: Weekday::Mon,
                nth: 1,
            }),
            "columbus_day" => Some(Self::NthWeekday {
                month: 10,
                weekday: Weekday::Mon,
                nth: 2,
            }),
            "veterans_day" => Some(Self::Fixed { month: 11, day: 11 }),
            "thanksgiving" => Some(Self::NthWeekday {
                month: 11,
                weekday: Weekday::Thu,
                nth: 4,
            }),
            "christmas" => Some(Self::Fixed { month: 12, day: 25 }),
            _ => None,
        }
    }

    /// The holiday's date in `year`, or `None` when the rule does not
    /// resolve (e.g. a 5th weekday that month lacks).
    #[must_use]
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        match *self {
            Self::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            Self::NthWeekday {
                month,
                weekday,
                nth,
            } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let offset = (weekday.num_days_from_monday() + 7
                    - first.weekday().num_days_from_monday())
                    % 7;
                let date = first + Duration::days(i64::from(offset) + 7 * (i64::from(nth) - 1));
                (date.month() == month).then_some(date)
            }
            Self::LastWeekday { month, weekday } => {
                let last = last_day_of_month(year, month)?;
                let back = (last.weekday().num_days_from_monday() + 7
                    - weekday.num_days_from_monday())
                    % 7;
                Some(last - Duration::days(i64::from(back)))
            }
        }
    }
}

/// All holiday dates near `around`, covering the surrounding three calendar
/// years so rounding windows that cross a year boundary still see them.
#[must_use]
pub fn dates_around(rules: &[HolidayRule], around: NaiveDate) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = rules
        .iter()
        .flat_map(|rule| {
            (around.year() - 1..=around.year() + 1).filter_map(|year| rule.date_in(year))
        })
        .collect();
    dates.sort_unstable();
    dates
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next_month_first.map(|d| d - Duration::days(1))
}
