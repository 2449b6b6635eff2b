//! # Reporting Periods
//!
//! Summary handlers bucket rows by local calendar periods. The business's
//! UTC offset comes from configuration; ranges are returned in UTC as
//! half-open intervals `[start, end)`.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
}

impl Period {
    /// Reads a period phrase. Unrecognized phrases return `None`.
    pub fn parse(text: &str) -> Option<Period> {
        let phrase = text
            .trim()
            .to_lowercase()
            .replace(['_', '-'], " ");
        match phrase.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "today" | "now" | "this day" => Some(Period::Today),
            "yesterday" | "last day" => Some(Period::Yesterday),
            "this week" | "week" | "weekly" => Some(Period::ThisWeek),
            "this month" | "month" | "monthly" => Some(Period::ThisMonth),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Yesterday => "yesterday",
            Period::ThisWeek => "this week",
            Period::ThisMonth => "this month",
        }
    }

    /// UTC bounds of the period containing `now`, in the local offset.
    ///
    /// Weeks start on Monday.
    pub fn range(&self, now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.with_timezone(&offset).date_naive();
        let (start, end) = match self {
            Period::Today => (today, today + Duration::days(1)),
            Period::Yesterday => (today - Duration::days(1), today),
            Period::ThisWeek => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (monday, monday + Duration::days(7))
            }
            Period::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                (first, first_of_next_month(first))
            }
        };
        (local_midnight(start, offset), local_midnight(end, offset))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Local calendar date of `now`.
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

fn first_of_next_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(first + Duration::days(31))
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}
