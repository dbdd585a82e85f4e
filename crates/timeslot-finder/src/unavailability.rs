//! Busy period indexing.
//!
//! Resolves configured [`Period`]s (fixed or yearly-recurring, wall-clock in
//! the configured timezone) into UTC intervals, drops the ones that cannot
//! affect the search window, and buckets the rest per local calendar day so
//! that the slot generator only ever scans the intervals of the day it works on.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::boundary::{saturating_add, saturating_sub, Boundaries};
use crate::dst;
use crate::types::{Configuration, Period, PeriodMoment};

/// A resolved busy interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Busy intervals grouped by local calendar day, each day sorted by start.
///
/// An interval is listed under every day it can influence: from the day a
/// slot placed right before it would start (leading buffer included) through
/// the day of its end plus the leading buffer of a slot right after it.
#[derive(Debug, Clone, Default)]
pub struct UnavailabilityIndex {
    days: BTreeMap<NaiveDate, Vec<BusyInterval>>,
    malformed: usize,
    out_of_window: usize,
}

impl UnavailabilityIndex {
    /// Index `config.unavailable_periods` for a search over `boundaries`.
    ///
    /// Periods that resolve to no real date, end before they start, or do not
    /// overlap `[first_from - buffer before, last_to + reach]` are dropped and
    /// counted, never reported as errors. The reach is the slot duration plus
    /// the leading buffer, or the trailing buffer when that is longer.
    pub fn build<Tz: TimeZone>(config: &Configuration, tz: &Tz, boundaries: &Boundaries) -> Self {
        let filter_min = saturating_sub(boundaries.first_from, config.buffer_before());
        let filter_max = saturating_add(boundaries.last_to, config.trailing_reach().max(config.buffer_after()));
        let reach_back = config.min_time_window_needed();
        let reach_forward = config.buffer_before();

        // One year of slack on the left catches recurring periods that wrap New Year.
        let years = (filter_min.with_timezone(tz).year() - 1)..=filter_max.with_timezone(tz).year();
        let first_day = filter_min.with_timezone(tz).date_naive();
        let last_day = filter_max.with_timezone(tz).date_naive();

        let mut index = UnavailabilityIndex::default();

        for period in &config.unavailable_periods {
            let occurrences = resolve_period(period, tz, years.clone());
            if occurrences.iter().all(|i| i.start > i.end) {
                index.malformed += 1;
                continue;
            }

            let mut retained = false;
            for interval in occurrences {
                if interval.start > interval.end || interval.start > filter_max || interval.end < filter_min {
                    continue;
                }
                retained = true;

                let from_day = saturating_sub(interval.start, reach_back)
                    .with_timezone(tz)
                    .date_naive()
                    .max(first_day);
                let to_day = saturating_add(interval.end, reach_forward)
                    .with_timezone(tz)
                    .date_naive()
                    .min(last_day);
                for day in from_day.iter_days().take_while(|d| *d <= to_day) {
                    index.days.entry(day).or_default().push(interval);
                }
            }
            if !retained {
                index.out_of_window += 1;
            }
        }

        for intervals in index.days.values_mut() {
            intervals.sort_by_key(|i| (i.start, i.end));
        }

        if index.discarded() > 0 {
            tracing::debug!(
                malformed = index.malformed,
                out_of_window = index.out_of_window,
                "discarded unavailable periods"
            );
        }

        index
    }

    /// The busy intervals relevant to `day`, sorted by start.
    pub fn for_day(&self, day: NaiveDate) -> &[BusyInterval] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Periods dropped because they name no real date or end before they start.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Periods dropped because they cannot affect the search window.
    pub fn out_of_window(&self) -> usize {
        self.out_of_window
    }

    pub fn discarded(&self) -> usize {
        self.malformed + self.out_of_window
    }

    /// Number of days with at least one busy interval.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }
}

/// Every concrete occurrence of `period` for the candidate `years`.
///
/// - fixed/fixed: the single occurrence it names.
/// - fixed/recurring (either way round): the recurring bound takes its
///   partner's year.
/// - recurring/recurring: one occurrence per year; an end falling before the
///   start in the same year rolls into the next one (Dec 31 → Jan 1).
///
/// Years in which a bound names no real date (Feb 29) produce nothing.
fn resolve_period<Tz: TimeZone>(period: &Period, tz: &Tz, years: RangeInclusive<i32>) -> Vec<BusyInterval> {
    let resolve = |moment: &PeriodMoment, year: i32| {
        moment
            .local_datetime(year)
            .map(|local| dst::resolve_forward(tz, local))
    };

    match (period.start_at.year(), period.end_at.year()) {
        (Some(year), _) | (None, Some(year)) => {
            match (resolve(&period.start_at, year), resolve(&period.end_at, year)) {
                (Some(start), Some(end)) => vec![BusyInterval::new(start, end)],
                _ => Vec::new(),
            }
        }
        (None, None) => years
            .filter_map(|year| {
                let start = resolve(&period.start_at, year)?;
                let mut end = resolve(&period.end_at, year)?;
                if end < start {
                    end = resolve(&period.end_at, year + 1)?;
                }
                Some(BusyInterval::new(start, end))
            })
            .collect(),
    }
}
