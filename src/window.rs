//! Date range selection and the timezone used for local-time rendering.

use crate::error::{ConvertError, Result};
use crate::record::LocationRecord;
use std::sync::Once;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing::warn;

/// Timezone for the local-time concerns: date bounds and CSV timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// Offset of the converting machine, resolved per instant.
    #[default]
    Local,
    Fixed(UtcOffset),
}

static LOCAL_OFFSET_WARNING: Once = Once::new();

impl Zone {
    pub fn utc() -> Self {
        Zone::Fixed(UtcOffset::UTC)
    }

    pub fn offset_at(&self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            Zone::Fixed(offset) => *offset,
            Zone::Local => UtcOffset::local_offset_at(instant).unwrap_or_else(|e| {
                LOCAL_OFFSET_WARNING.call_once(|| {
                    warn!("Cannot determine local UTC offset ({e}), using UTC instead");
                });
                UtcOffset::UTC
            }),
        }
    }

    pub fn to_zone(&self, instant: OffsetDateTime) -> OffsetDateTime {
        instant.to_offset(self.offset_at(instant))
    }

    /// Midnight at the start of `date` in this zone.
    pub fn midnight(&self, date: Date) -> OffsetDateTime {
        local_midnight(date, |instant| self.offset_at(instant))
    }
}

// The offset in effect at midnight may differ from the one at midnight UTC
// when a transition falls between the two, so it is looked up again at the
// first candidate instant.
fn local_midnight(date: Date, offset_at: impl Fn(OffsetDateTime) -> UtcOffset) -> OffsetDateTime {
    let naive = PrimitiveDateTime::new(date, Time::MIDNIGHT);
    let candidate = naive.assume_offset(offset_at(naive.assume_utc()));
    naive.assume_offset(offset_at(candidate))
}

/// Parses a `yyyy/mm/dd` date; month and day may omit the leading zero.
pub fn parse_date(s: &str) -> std::result::Result<Date, time::error::Parse> {
    Date::parse(
        s.trim(),
        format_description!("[year]/[month padding:none]/[day padding:none]"),
    )
}

pub fn epoch_ms(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Inclusive `[start_ms, end_ms]` selection in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        TimeWindow { start_ms, end_ms }
    }

    /// Everything from the epoch up to the present.
    pub fn up_to_now() -> Self {
        TimeWindow::new(0, epoch_ms(OffsetDateTime::now_utc()))
    }

    /// Builds the window from the `--startdate` / `--enddate` strings.
    ///
    /// Both bounds resolve to midnight in `zone`. If either date is missing the
    /// whole history up to now is selected.
    pub fn from_dates(start: Option<&str>, end: Option<&str>, zone: Zone) -> Result<Self> {
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            (None, None) => return Ok(TimeWindow::up_to_now()),
            (start, end) => {
                warn!(
                    ?start,
                    ?end,
                    "Date range needs both a start and an end date, converting all records"
                );
                return Ok(TimeWindow::up_to_now());
            }
        };

        let bound = |name: &'static str, value: &str| -> Result<i64> {
            let date = parse_date(value).map_err(|source| ConvertError::DateFormat {
                bound: name,
                value: value.to_string(),
                source,
            })?;
            Ok(epoch_ms(zone.midnight(date)))
        };

        Ok(TimeWindow::new(bound("start", start)?, bound("end", end)?))
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        self.start_ms <= timestamp_ms && timestamp_ms <= self.end_ms
    }

    pub fn filter<'a, I>(&self, records: I) -> impl Iterator<Item = &'a LocationRecord>
    where
        I: IntoIterator<Item = &'a LocationRecord>,
    {
        let window = *self;
        records
            .into_iter()
            .filter(move |record| window.contains(record.timestamp_ms))
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::up_to_now()
    }
}
