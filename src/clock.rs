//! Time source for the membership, ledger and reporting engines.
//!
//! Engine code never reads the wall clock directly; it asks an injected [`Clock`].
//! Calendar days are evaluated in UTC.

use std::sync::RwLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Supplies the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of [`Clock::now`].
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    /// Midnight UTC of the given calendar day. Panics on an invalid date.
    pub fn at_date(year: i32, month: u32, day: u32) -> Self {
        let instant = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or_else(|| panic!("invalid date {year}-{month}-{day}"));
        Self::new(instant)
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self
            .instant
            .write()
            .unwrap_or_else(|poison| poison.into_inner()) = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self
            .instant
            .write()
            .unwrap_or_else(|poison| poison.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .instant
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
