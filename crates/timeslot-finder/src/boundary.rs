//! Effective search window resolution.
//!
//! Narrows the caller's `[from, to]` so that no slot is offered in the past,
//! the minimum booking notice is respected, and nothing lies beyond the
//! booking horizon.

use chrono::{DateTime, Days, Duration, TimeZone, Timelike, Utc};

use crate::dst;
use crate::error::{FinderError, Result};
use crate::types::Configuration;

/// The effective search window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries {
    pub first_from: DateTime<Utc>,
    pub last_to: DateTime<Utc>,
}

impl Boundaries {
    /// True when lead time or horizon left nothing to search.
    pub fn is_empty(&self) -> bool {
        self.first_from > self.last_to
    }
}

/// Resolve the effective window for a search made at `now`.
///
/// - `first_from = max(from, now + buffer before + min time before first slot)`,
///   truncated to the minute.
/// - `last_to = min(to, end of the local day "max days" after today)` when a
///   horizon is configured, else `to`; never later than [`latest`].
///
/// Window arithmetic saturates near the ends of the representable range, so
/// an open-ended `to` such as `DateTime::<Utc>::MAX_UTC` is accepted.
///
/// # Errors
/// Returns `FinderError::InvalidWindow` if `from` is after `to`. The check is
/// made on the raw inputs; a window that only becomes empty after resolution
/// is returned as is (see [`Boundaries::is_empty`]).
pub fn compute_boundaries<Tz: TimeZone>(
    config: &Configuration,
    tz: &Tz,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Boundaries> {
    if from > to {
        return Err(FinderError::InvalidWindow(format!(
            "from ({}) is after to ({})",
            from.to_rfc3339(),
            to.to_rfc3339()
        )));
    }

    let first_from = truncate_to_minute(from.max(saturating_add(now, config.lead_time())));

    let last_to = match config.max_days_ahead() {
        Some(days) => {
            let today = now.with_timezone(tz).date_naive();
            match today.checked_add_days(Days::new(u64::from(days))) {
                Some(horizon) if horizon < latest().date_naive() => to.min(dst::end_of_day(tz, horizon)),
                _ => to,
            }
        }
        None => to,
    };
    let last_to = last_to.min(latest());

    let boundaries = Boundaries {
        first_from,
        last_to,
    };
    tracing::debug!(
        first_from = %boundaries.first_from,
        last_to = %boundaries.last_to,
        "resolved search boundaries"
    );
    Ok(boundaries)
}

// Margin kept from chrono's representable range so that converting a bound
// to local time, or to the local day around it, cannot overflow.
const EDGE_MARGIN_DAYS: i64 = 2;

/// The latest instant a search works with. Later `to` bounds are clamped to it.
pub(crate) fn latest() -> DateTime<Utc> {
    DateTime::<Utc>::MAX_UTC - Duration::days(EDGE_MARGIN_DAYS)
}

pub(crate) fn earliest() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC + Duration::days(EDGE_MARGIN_DAYS)
}

/// `dt + delta`, clamped to [`latest`] instead of overflowing.
pub(crate) fn saturating_add(dt: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    dt.checked_add_signed(delta).map_or_else(latest, |v| v.min(latest()))
}

/// `dt - delta`, clamped to [`earliest`] instead of overflowing.
pub(crate) fn saturating_sub(dt: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    dt.checked_sub_signed(delta).map_or_else(earliest, |v| v.max(earliest()))
}

/// Drop seconds and sub-second precision.
pub(crate) fn truncate_to_minute(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt - Duration::seconds(i64::from(dt.second())) - Duration::nanoseconds(i64::from(dt.nanosecond()))
}

/// Round up to the next whole minute unless already on one.
pub(crate) fn ceil_to_minute(dt: DateTime<Utc>) -> DateTime<Utc> {
    let floor = truncate_to_minute(dt);
    if floor == dt {
        dt
    } else {
        floor + Duration::minutes(1)
    }
}
