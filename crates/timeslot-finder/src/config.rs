//! Configuration defaults, weekly shift merging and static validation.
//!
//! The slot search itself only needs the accessors on [`Configuration`].
//! [`validate_configuration`] is meant for callers that want to reject a bad
//! configuration up front; the search never calls it and degrades gracefully
//! on malformed input instead.

use chrono::{Duration, NaiveDateTime};
use chrono_tz::Tz;

use crate::error::{FinderError, Result};
use crate::types::{AvailablePeriod, Configuration, Period, Shift};

/// Slot start alignment used when `slot_start_minute_step` is unset.
pub const DEFAULT_SLOT_START_MINUTE_STEP: u32 = 5;

/// Upper bound accepted for `slot_start_minute_step`.
pub const MAX_SLOT_START_MINUTE_STEP: u32 = 30;

const MINUTES_PER_DAY: u32 = 24 * 60;

// Leap year used to check that a recurring moment names a real date.
const LEAP_YEAR: i32 = 2000;

fn minutes(value: u32) -> Duration {
    Duration::minutes(i64::from(value))
}

impl Configuration {
    pub fn slot_duration(&self) -> Duration {
        minutes(self.time_slot_duration)
    }

    /// The alignment step for slot starts, never below 1.
    pub fn slot_start_minute_step(&self) -> u32 {
        self.slot_start_minute_step
            .unwrap_or(DEFAULT_SLOT_START_MINUTE_STEP)
            .max(1)
    }

    pub fn buffer_before(&self) -> Duration {
        minutes(self.min_available_time_before_slot.unwrap_or(0))
    }

    pub fn buffer_after(&self) -> Duration {
        minutes(self.min_available_time_after_slot.unwrap_or(0))
    }

    /// Distance kept from the end of a search window: the slot plus its leading buffer.
    pub fn trailing_reach(&self) -> Duration {
        self.slot_duration() + self.buffer_before()
    }

    /// Free time a slot occupies together with both of its buffers.
    pub fn min_time_window_needed(&self) -> Duration {
        self.buffer_before() + self.slot_duration() + self.buffer_after()
    }

    /// Minimum distance between "now" and the first slot's leading buffer.
    pub fn lead_time(&self) -> Duration {
        self.buffer_before() + minutes(self.min_time_before_first_slot.unwrap_or(0))
    }

    /// The booking horizon in days. Zero means no horizon.
    pub fn max_days_ahead(&self) -> Option<u32> {
        self.max_days_before_last_slot.filter(|days| *days > 0)
    }

    /// Parse `time_zone` as an IANA timezone.
    ///
    /// # Errors
    /// Returns `FinderError::InvalidTimezone` if the name is unknown.
    pub fn timezone(&self) -> Result<Tz> {
        self.time_zone
            .parse()
            .map_err(|_| FinderError::InvalidTimezone(self.time_zone.clone()))
    }
}

/// Merge overlapping or touching shifts of each weekday.
///
/// Entries sharing an ISO weekday are combined into one (kept at the position
/// of the first), and each weekday's shifts come back sorted by start time.
///
/// # Errors
/// Returns `FinderError::InvalidConfiguration` if a weekday is outside 1..=7
/// or a shift does not start before it ends.
pub fn merge_overlapping_shifts(periods: &[AvailablePeriod]) -> Result<Vec<AvailablePeriod>> {
    let mut merged: Vec<AvailablePeriod> = Vec::new();

    for period in periods {
        check_weekday(period.iso_week_day)?;
        for shift in &period.shifts {
            check_shift(period.iso_week_day, shift)?;
        }
        match merged
            .iter_mut()
            .find(|p| p.iso_week_day == period.iso_week_day)
        {
            Some(existing) => existing.shifts.extend(period.shifts.iter().copied()),
            None => merged.push(period.clone()),
        }
    }

    for period in &mut merged {
        period.shifts.sort_by_key(|s| (s.start_time, s.end_time));
        let mut shifts: Vec<Shift> = Vec::with_capacity(period.shifts.len());
        for shift in period.shifts.drain(..) {
            if let Some(last) = shifts.last_mut() {
                if shift.start_time <= last.end_time {
                    last.end_time = last.end_time.max(shift.end_time);
                    continue;
                }
            }
            shifts.push(shift);
        }
        period.shifts = shifts;
    }

    Ok(merged)
}

/// Check a configuration against every static rule.
///
/// # Errors
/// Returns `FinderError::InvalidTimezone` for an unknown timezone and
/// `FinderError::InvalidConfiguration` describing the first other violation.
pub fn validate_configuration(config: &Configuration) -> Result<()> {
    if config.time_slot_duration == 0 || config.time_slot_duration > MINUTES_PER_DAY {
        return Err(invalid(format!(
            "timeSlotDuration must be between 1 and {} minutes, got {}",
            MINUTES_PER_DAY, config.time_slot_duration
        )));
    }

    if let Some(step) = config.slot_start_minute_step {
        if step == 0 || step > MAX_SLOT_START_MINUTE_STEP {
            return Err(invalid(format!(
                "slotStartMinuteStep must be between 1 and {}, got {}",
                MAX_SLOT_START_MINUTE_STEP, step
            )));
        }
    }

    config.timezone()?;

    validate_available_periods(&config.available_periods)?;

    for (index, period) in config.unavailable_periods.iter().enumerate() {
        validate_unavailable_period(period)
            .map_err(|reason| invalid(format!("unavailablePeriods[{}]: {}", index, reason)))?;
    }

    if let (Some(lead), Some(days)) = (config.min_time_before_first_slot, config.max_days_ahead()) {
        if u64::from(lead) > u64::from(days) * u64::from(MINUTES_PER_DAY) {
            return Err(invalid(format!(
                "minTimeBeforeFirstSlot ({} minutes) exceeds maxDaysBeforeLastSlot ({} days)",
                lead, days
            )));
        }
    }

    Ok(())
}

fn validate_available_periods(periods: &[AvailablePeriod]) -> Result<()> {
    let mut seen = [false; 7];
    for period in periods {
        check_weekday(period.iso_week_day)?;
        let slot = &mut seen[(period.iso_week_day - 1) as usize];
        if *slot {
            return Err(invalid(format!(
                "isoWeekDay {} is configured more than once",
                period.iso_week_day
            )));
        }
        *slot = true;

        let mut shifts = period.shifts.clone();
        for shift in &shifts {
            check_shift(period.iso_week_day, shift)?;
        }
        shifts.sort_by_key(|s| s.start_time);
        if let Some(pair) = shifts.windows(2).find(|w| w[1].start_time < w[0].end_time) {
            return Err(invalid(format!(
                "overlapping shifts on isoWeekDay {}: {}-{} and {}-{}",
                period.iso_week_day,
                pair[0].start_time.format("%H:%M"),
                pair[0].end_time.format("%H:%M"),
                pair[1].start_time.format("%H:%M"),
                pair[1].end_time.format("%H:%M"),
            )));
        }
    }
    Ok(())
}

fn validate_unavailable_period(period: &Period) -> std::result::Result<(), String> {
    if period.start_at.is_recurring() != period.end_at.is_recurring() {
        return Err("startAt and endAt must both have a year or both omit it".to_string());
    }
    let start = resolvable(period.start_at.local_datetime(LEAP_YEAR), "startAt")?;
    let end = resolvable(period.end_at.local_datetime(LEAP_YEAR), "endAt")?;
    // Recurring periods may wrap over New Year, so only fixed ones are ordered.
    if !period.start_at.is_recurring() && start > end {
        return Err("startAt is after endAt".to_string());
    }
    Ok(())
}

fn resolvable(local: Option<NaiveDateTime>, field: &str) -> std::result::Result<NaiveDateTime, String> {
    local.ok_or_else(|| format!("{} is not a valid date", field))
}

fn check_weekday(iso_week_day: u32) -> Result<()> {
    if (1..=7).contains(&iso_week_day) {
        Ok(())
    } else {
        Err(invalid(format!("isoWeekDay must be between 1 and 7, got {}", iso_week_day)))
    }
}

fn check_shift(iso_week_day: u32, shift: &Shift) -> Result<()> {
    if shift.start_time < shift.end_time {
        Ok(())
    } else {
        Err(invalid(format!(
            "shift {}-{} on isoWeekDay {} must start before it ends",
            shift.start_time.format("%H:%M"),
            shift.end_time.format("%H:%M"),
            iso_week_day
        )))
    }
}

fn invalid(message: String) -> FinderError {
    FinderError::InvalidConfiguration(message)
}
