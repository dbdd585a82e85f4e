//! DST transition policies for wall-clock times.
//!
//! Shift boundaries and busy periods are written as local wall-clock times.
//! Around DST transitions some of those times do not exist (spring forward)
//! or exist twice (fall back). Everything here maps a local time onto a
//! single UTC instant.

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Policy for wall-clock times that fall in a DST gap (e.g. 02:30 during spring forward).
///
/// Ambiguous times (the repeated hour when clocks fall back) always resolve
/// to the earliest instant, whatever the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DstPolicy {
    /// Drop times inside the gap.
    Skip,
    /// Read the time with the offset in force before the gap, which lands past
    /// it: 02:30 becomes 03:30 when clocks jump from 02:00 to 03:00.
    #[default]
    ShiftForward,
}

impl DstPolicy {
    /// Resolve a local wall-clock time in `tz` to a UTC instant.
    ///
    /// Returns `None` only for [`DstPolicy::Skip`] when `local` is inside a gap.
    pub fn resolve<Tz: TimeZone>(self, tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => match self {
                DstPolicy::Skip => None,
                DstPolicy::ShiftForward => Some(shift_past_gap(tz, local)),
            },
        }
    }
}

/// Resolve `local` with [`DstPolicy::ShiftForward`] semantics. Never fails.
pub fn resolve_forward<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => shift_past_gap(tz, local),
    }
}

/// The first instant of `date` in `tz`.
///
/// Zones that skip midnight itself (historically e.g. America/Sao_Paulo)
/// start the day at the end of the gap.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    resolve_forward(tz, date.and_time(NaiveTime::MIN))
}

/// The last millisecond of `date` in `tz`.
pub fn end_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let next = date.succ_opt().unwrap_or(date);
    start_of_day(tz, next) - Duration::milliseconds(1)
}

// Gaps never come closer than a day to the previous transition in the tz database,
// so the offset a day earlier is the one in force right before the gap.
fn shift_past_gap<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    let before = tz.offset_from_utc_datetime(&(local - Duration::days(1))).fix();
    (local - Duration::seconds(i64::from(before.local_minus_utc()))).and_utc()
}
