//! Day-by-day shift walking and the public search entry points.
//!
//! The walker steps through local calendar dates (never through 24-hour
//! increments, which drift on DST days), picks the weekly shifts of each
//! date's weekday, clips them to the effective window and hands each one to
//! the [`SlotGenerator`] together with that date's busy intervals.

use std::borrow::Cow;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::boundary::{compute_boundaries, Boundaries};
use crate::config::merge_overlapping_shifts;
use crate::error::{FinderError, Result};
use crate::generator::SlotGenerator;
use crate::types::{AvailablePeriod, Configuration, TimeSlot};
use crate::unavailability::UnavailabilityIndex;

/// A search as submitted by a client: the configuration plus the window.
///
/// `from` and `to` are optional on the wire so that a missing bound is
/// reported as [`FinderError::InvalidWindow`] rather than a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub configuration: Configuration,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl SearchRequest {
    pub fn new(configuration: Configuration, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            configuration,
            from: Some(from),
            to: Some(to),
        }
    }

    /// Parse a request from its JSON form.
    ///
    /// # Errors
    /// Returns `FinderError::JsonParse` if the JSON is malformed or does not
    /// match the request shape.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Run the search as of `now`.
    ///
    /// # Errors
    /// See [`search`]; additionally fails with `FinderError::InvalidWindow`
    /// when `from` or `to` is missing.
    pub fn search(&self, now: DateTime<Utc>) -> Result<SlotSearch> {
        let (from, to) = match (self.from, self.to) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                return Err(FinderError::InvalidWindow(
                    "from and to are both required".to_string(),
                ))
            }
        };
        search(&self.configuration, from, to, now)
    }

    /// Like [`SearchRequest::search`], returning only the slots.
    pub fn run(&self, now: DateTime<Utc>) -> Result<Vec<TimeSlot>> {
        Ok(self.search(now)?.slots)
    }

    /// Run the search against the system clock.
    pub fn run_now(&self) -> Result<Vec<TimeSlot>> {
        self.run(Utc::now())
    }
}

/// The outcome of a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSearch {
    /// Bookable slots, strictly ordered and non-overlapping.
    pub slots: Vec<TimeSlot>,
    /// Start of the effective window.
    pub first_from: DateTime<Utc>,
    /// End of the effective window.
    pub last_to: DateTime<Utc>,
    /// Unavailable periods dropped as malformed or irrelevant to the window.
    pub discarded_periods: usize,
}

/// Find every bookable slot in `[from, to]` as of `now`.
///
/// # Errors
/// Returns `FinderError::InvalidWindow` if `from` is after `to`, and
/// `FinderError::InvalidTimezone` if the configured timezone is unknown.
///
/// # Examples
///
/// ```
/// use timeslot_finder::{find_time_slots, AvailablePeriod, Configuration, Shift};
///
/// let config = Configuration {
///     available_periods: vec![AvailablePeriod {
///         iso_week_day: 4,
///         shifts: vec![Shift::parse("12:00", "22:00").unwrap()],
///     }],
///     ..Configuration::new(60, "Europe/Paris")
/// };
/// let slots = find_time_slots(
///     &config,
///     "2020-10-15T15:00:00Z".parse().unwrap(),
///     "2020-10-15T20:00:00Z".parse().unwrap(),
///     "2020-10-14T15:00:00Z".parse().unwrap(),
/// )
/// .unwrap();
/// assert_eq!(slots.len(), 5);
/// ```
pub fn find_time_slots(
    config: &Configuration,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Vec<TimeSlot>> {
    Ok(search(config, from, to, now)?.slots)
}

/// Like [`find_time_slots`], also reporting the effective window and the
/// number of discarded unavailable periods.
///
/// # Errors
/// Same as [`find_time_slots`].
pub fn search(
    config: &Configuration,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<SlotSearch> {
    let tz = config.timezone()?;
    search_in(config, &tz, from, to, now)
}

/// Run a search with an explicit timezone implementation instead of the
/// configured IANA name. `config.time_zone` is ignored.
///
/// # Errors
/// Returns `FinderError::InvalidWindow` if `from` is after `to`, and
/// `FinderError::Stalled` if slot generation fails to make progress, which
/// only a zero-minute `time_slot_duration` can cause.
pub fn search_in<Tz: TimeZone>(
    config: &Configuration,
    tz: &Tz,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<SlotSearch> {
    let boundaries = compute_boundaries(config, tz, from, to, now)?;
    if boundaries.is_empty() {
        tracing::debug!("effective window is empty");
        return Ok(SlotSearch {
            slots: Vec::new(),
            first_from: boundaries.first_from,
            last_to: boundaries.last_to,
            discarded_periods: config.unavailable_periods.len(),
        });
    }

    let (available_periods, merged) = match merge_overlapping_shifts(&config.available_periods) {
        Ok(periods) => (Cow::Owned(periods), true),
        Err(e) => {
            tracing::warn!(error = %e, "could not merge available periods, using them unmerged");
            (Cow::Borrowed(config.available_periods.as_slice()), false)
        }
    };

    let index = UnavailabilityIndex::build(config, tz, &boundaries);
    let mut slots = walk_shifts(config, tz, &available_periods, &index, &boundaries)?;

    if !merged {
        // Unmerged shifts may overlap or come out of order.
        slots.sort_by_key(|s| s.start_at);
        let mut last_end: Option<DateTime<Utc>> = None;
        slots.retain(|slot| {
            let keep = last_end.map_or(true, |end| slot.start_at >= end);
            if keep {
                last_end = Some(slot.end_at);
            }
            keep
        });
    }

    tracing::debug!(
        slots = slots.len(),
        busy_days = index.day_count(),
        discarded = index.discarded(),
        "slot search complete"
    );

    Ok(SlotSearch {
        slots,
        first_from: boundaries.first_from,
        last_to: boundaries.last_to,
        discarded_periods: index.discarded(),
    })
}

fn walk_shifts<Tz: TimeZone>(
    config: &Configuration,
    tz: &Tz,
    available_periods: &[AvailablePeriod],
    index: &UnavailabilityIndex,
    boundaries: &Boundaries,
) -> Result<Vec<TimeSlot>> {
    let generator = SlotGenerator::new(config, tz);
    let first_day = boundaries.first_from.with_timezone(tz).date_naive();
    let last_day = boundaries.last_to.with_timezone(tz).date_naive();

    let mut slots = Vec::new();
    for day in first_day.iter_days().take_while(|d| *d <= last_day) {
        let weekday = day.weekday().number_from_monday();
        let Some(period) = available_periods.iter().find(|p| p.iso_week_day == weekday) else {
            continue;
        };

        for shift in &period.shifts {
            let policy = config.dst_gap_policy;
            let (Some(start), Some(end)) = (
                policy.resolve(tz, day.and_time(shift.start_time)),
                policy.resolve(tz, day.and_time(shift.end_time)),
            ) else {
                tracing::trace!(%day, "shift boundary falls in a DST gap, skipped");
                continue;
            };

            let from = start.max(boundaries.first_from);
            let to = end.min(boundaries.last_to);
            if from >= to {
                continue;
            }

            let shift_slots = generator.generate(index.for_day(day), from, to)?;
            tracing::trace!(%day, count = shift_slots.len(), "generated shift slots");
            slots.extend(shift_slots);
        }
    }

    Ok(slots)
}
