//! The reconciliation window.
//!
//! One window is computed per run and shared by the source query and the
//! cloud query, so both sides always compare the same range.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{SyncError, SyncResult};

/// Half-open range `[start, end)` anchored at local midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl SyncWindow {
    /// Window covering `days` calendar days starting today in `tz`.
    pub fn starting_today(tz: Tz, days: u32) -> SyncResult<Self> {
        Self::starting_at(Utc::now(), tz, days)
    }

    /// Window covering `days` calendar days starting on the local day of `now`.
    pub fn starting_at(now: DateTime<Utc>, tz: Tz, days: u32) -> SyncResult<Self> {
        let today = now.with_timezone(&tz).date_naive();
        let last = today
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| SyncError::Config(format!("window of {} days overflows", days)))?;

        Ok(SyncWindow {
            start: local_midnight(today, tz)?,
            end: local_midnight(last, tz)?,
        })
    }

    pub fn contains(&self, time: &DateTime<Tz>) -> bool {
        *time >= self.start && *time < self.end
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    pub fn time_zone(&self) -> Tz {
        self.start.timezone()
    }
}

/// Midnight of `date` in `tz`. Zones that skip midnight on a DST change
/// start the day at the first representable instant after it.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> SyncResult<DateTime<Tz>> {
    let naive = date.and_time(NaiveTime::MIN);

    (0..=2)
        .find_map(|hour| {
            tz.from_local_datetime(&(naive + chrono::Duration::hours(hour)))
                .earliest()
        })
        .ok_or_else(|| SyncError::Config(format!("no local midnight for {} in {}", date, tz)))
}
