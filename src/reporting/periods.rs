//! Chart periods and their fixed date buckets.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChartPeriod {
    /// Seven daily buckets ending today
    Week,
    /// Four Monday-anchored weekly buckets ending with the current week
    Month,
    /// Twelve calendar-month buckets ending with the current month
    Year,
}

impl ChartPeriod {
    pub fn bucket_count(self) -> usize {
        match self {
            ChartPeriod::Week => 7,
            ChartPeriod::Month => 4,
            ChartPeriod::Year => 12,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartPeriod::Week => "week",
            ChartPeriod::Month => "month",
            ChartPeriod::Year => "year",
        }
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartPeriod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(ChartPeriod::Week),
            "month" => Ok(ChartPeriod::Month),
            "year" => Ok(ChartPeriod::Year),
            other => Err(format!(
                "unknown period '{other}', expected one of week, month, year"
            )),
        }
    }
}

/// Inclusive date range with a display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Bucket {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Buckets of `period` relative to `today`, oldest first.
pub fn buckets(period: ChartPeriod, today: NaiveDate) -> Vec<Bucket> {
    match period {
        ChartPeriod::Week => (0..7i64)
            .rev()
            .map(|back| {
                let day = today - Duration::days(back);
                Bucket {
                    label: day.format("%d/%m").to_string(),
                    start: day,
                    end: day,
                }
            })
            .collect(),
        ChartPeriod::Month => {
            let offset_to_monday = i64::from(today.weekday().num_days_from_monday());
            (0..4i64)
                .rev()
                .map(|back| {
                    let start = today - Duration::days(7 * back + offset_to_monday);
                    Bucket {
                        label: format!("Week {}", 4 - back),
                        start,
                        end: start + Duration::days(6),
                    }
                })
                .collect()
        }
        ChartPeriod::Year => {
            let mut starts = Vec::with_capacity(12);
            let mut start = first_of_month(today);
            for _ in 0..12 {
                starts.push(start);
                start = first_of_month(start - Duration::days(1));
            }
            starts
                .into_iter()
                .rev()
                .map(|start| Bucket {
                    label: start.format("%b").to_string(),
                    start,
                    end: last_of_month(start),
                })
                .collect()
        }
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn first_of_year(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.ordinal0()))
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    // The 1st plus 31 days always lands in the following month
    first_of_month(first_of_month(date) + Duration::days(31)) - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_buckets_are_daily_and_end_today() {
        let today = date(2025, 3, 5);
        let week = buckets(ChartPeriod::Week, today);

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].start, date(2025, 2, 27));
        assert_eq!(week[0].label, "27/02");
        assert_eq!(week[6].start, today);
        assert_eq!(week[6].label, "05/03");
        assert!(week.iter().all(|bucket| bucket.start == bucket.end));
    }

    #[test]
    fn month_buckets_are_monday_anchored_and_contiguous() {
        // Wednesday
        let today = date(2025, 3, 5);
        let month = buckets(ChartPeriod::Month, today);

        assert_eq!(month.len(), 4);
        assert_eq!(month[3].start, date(2025, 3, 3));
        assert_eq!(month[3].end, date(2025, 3, 9));
        assert_eq!(month[0].start, date(2025, 2, 10));
        assert_eq!(month[0].label, "Week 1");
        assert_eq!(month[3].label, "Week 4");
        for pair in month.windows(2) {
            assert_eq!(pair[0].end + Duration::days(1), pair[1].start);
            assert_eq!(pair[0].start.weekday(), chrono::Weekday::Mon);
        }
    }

    #[test]
    fn year_buckets_cover_twelve_calendar_months() {
        let today = date(2025, 3, 5);
        let year = buckets(ChartPeriod::Year, today);

        assert_eq!(year.len(), 12);
        assert_eq!(year[0].start, date(2024, 4, 1));
        assert_eq!(year[0].end, date(2024, 4, 30));
        assert_eq!(year[0].label, "Apr");
        assert_eq!(year[10].start, date(2025, 2, 1));
        assert_eq!(year[10].end, date(2025, 2, 28));
        assert_eq!(year[11].label, "Mar");
        assert_eq!(year[11].end, date(2025, 3, 31));
        for pair in year.windows(2) {
            assert_eq!(pair[0].end + Duration::days(1), pair[1].start);
        }
    }

    #[test]
    fn leap_february_ends_on_the_29th() {
        let year = buckets(ChartPeriod::Year, date(2024, 2, 10));
        assert_eq!(year[11].end, date(2024, 2, 29));
    }

    #[test]
    fn period_parsing() {
        assert_eq!("Week".parse::<ChartPeriod>(), Ok(ChartPeriod::Week));
        assert_eq!("year".parse::<ChartPeriod>(), Ok(ChartPeriod::Year));
        assert!("decade".parse::<ChartPeriod>().is_err());
    }

    #[test]
    fn calendar_anchors() {
        assert_eq!(first_of_month(date(2025, 3, 5)), date(2025, 3, 1));
        assert_eq!(first_of_year(date(2025, 3, 5)), date(2025, 1, 1));
    }
}
