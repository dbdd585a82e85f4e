//! Tests for configuration defaults, shift merging and validation.

use chrono::Duration;
use timeslot_finder::{
    merge_overlapping_shifts, validate_configuration, AvailablePeriod, Configuration, FinderError,
    Period, PeriodMoment, Shift,
};

fn weekly(iso_week_day: u32, shifts: &[(&str, &str)]) -> AvailablePeriod {
    AvailablePeriod {
        iso_week_day,
        shifts: shifts
            .iter()
            .map(|(start, end)| Shift::parse(start, end).unwrap())
            .collect(),
    }
}

fn valid() -> Configuration {
    Configuration {
        available_periods: vec![weekly(1, &[("09:00", "12:00"), ("14:00", "18:00")]), weekly(5, &[("10:00", "20:00")])],
        ..Configuration::new(30, "Europe/Paris")
    }
}

fn assert_invalid(config: &Configuration, fragment: &str) {
    match validate_configuration(config) {
        Err(FinderError::InvalidConfiguration(message)) => {
            assert!(message.contains(fragment), "'{}' does not mention '{}'", message, fragment)
        }
        other => panic!("expected InvalidConfiguration, got {:?}", other),
    }
}

// ── Accessors ───────────────────────────────────────────────────────────────

#[test]
fn optional_rules_default_to_zero() {
    let config = Configuration::new(30, "UTC");
    assert_eq!(config.slot_start_minute_step(), 5);
    assert_eq!(config.buffer_before(), Duration::zero());
    assert_eq!(config.buffer_after(), Duration::zero());
    assert_eq!(config.lead_time(), Duration::zero());
    assert_eq!(config.max_days_ahead(), None);
    assert_eq!(config.min_time_window_needed(), Duration::minutes(30));
    assert_eq!(config.trailing_reach(), Duration::minutes(30));
}

#[test]
fn derived_durations_combine_buffers() {
    let config = Configuration {
        min_available_time_before_slot: Some(10),
        min_available_time_after_slot: Some(5),
        min_time_before_first_slot: Some(60),
        max_days_before_last_slot: Some(0),
        slot_start_minute_step: Some(0),
        ..Configuration::new(30, "UTC")
    };
    assert_eq!(config.min_time_window_needed(), Duration::minutes(45));
    assert_eq!(config.trailing_reach(), Duration::minutes(40));
    assert_eq!(config.lead_time(), Duration::minutes(70));
    assert_eq!(config.max_days_ahead(), None);
    assert_eq!(config.slot_start_minute_step(), 1);
}

#[test]
fn unknown_timezone() {
    let config = Configuration::new(30, "Europe/Atlantis");
    assert!(matches!(config.timezone(), Err(FinderError::InvalidTimezone(name)) if name == "Europe/Atlantis"));
}

// ── Shift merging ───────────────────────────────────────────────────────────

#[test]
fn overlapping_and_touching_shifts_merge() {
    let merged = merge_overlapping_shifts(&[weekly(
        3,
        &[("14:00", "16:00"), ("09:00", "12:00"), ("11:00", "13:00"), ("13:00", "13:30")],
    )])
    .unwrap();
    assert_eq!(merged, vec![weekly(3, &[("09:00", "13:30"), ("14:00", "16:00")])]);
}

#[test]
fn contained_shift_disappears() {
    let merged = merge_overlapping_shifts(&[weekly(2, &[("08:00", "18:00"), ("10:00", "11:00")])]).unwrap();
    assert_eq!(merged, vec![weekly(2, &[("08:00", "18:00")])]);
}

#[test]
fn entries_for_the_same_weekday_are_combined() {
    let merged = merge_overlapping_shifts(&[
        weekly(5, &[("10:00", "12:00")]),
        weekly(1, &[("09:00", "10:00")]),
        weekly(5, &[("11:00", "15:00")]),
    ])
    .unwrap();
    assert_eq!(
        merged,
        vec![weekly(5, &[("10:00", "15:00")]), weekly(1, &[("09:00", "10:00")])]
    );
}

#[test]
fn merge_rejects_bad_weekday() {
    let result = merge_overlapping_shifts(&[weekly(0, &[("10:00", "12:00")])]);
    assert!(matches!(result, Err(FinderError::InvalidConfiguration(_))));
}

#[test]
fn merge_rejects_inverted_shift() {
    let result = merge_overlapping_shifts(&[weekly(4, &[("12:00", "10:00")])]);
    assert!(matches!(result, Err(FinderError::InvalidConfiguration(_))));
}

// ── Validation ──────────────────────────────────────────────────────────────

#[test]
fn valid_configuration_passes() {
    let config = Configuration {
        slot_start_minute_step: Some(15),
        unavailable_periods: vec![
            Period::new(PeriodMoment::fixed(2020, 9, 16).at(12, 30), PeriodMoment::fixed(2020, 9, 16).at(14, 0)),
            Period::new(PeriodMoment::recurring(11, 24), PeriodMoment::recurring(0, 2)),
        ],
        min_time_before_first_slot: Some(120),
        max_days_before_last_slot: Some(30),
        ..valid()
    };
    validate_configuration(&config).unwrap();
}

#[test]
fn duration_out_of_range() {
    assert_invalid(&Configuration { time_slot_duration: 0, ..valid() }, "timeSlotDuration");
    assert_invalid(&Configuration { time_slot_duration: 24 * 60 + 1, ..valid() }, "timeSlotDuration");
}

#[test]
fn step_out_of_range() {
    assert_invalid(&Configuration { slot_start_minute_step: Some(0), ..valid() }, "slotStartMinuteStep");
    assert_invalid(&Configuration { slot_start_minute_step: Some(45), ..valid() }, "slotStartMinuteStep");
}

#[test]
fn bad_timezone_is_its_own_error() {
    let config = Configuration {
        time_zone: "Nowhere/Special".to_string(),
        ..valid()
    };
    assert!(matches!(validate_configuration(&config), Err(FinderError::InvalidTimezone(_))));
}

#[test]
fn weekday_configured_twice() {
    let mut config = valid();
    config.available_periods.push(weekly(1, &[("19:00", "20:00")]));
    assert_invalid(&config, "more than once");
}

#[test]
fn overlapping_shifts_are_reported() {
    let config = Configuration {
        available_periods: vec![weekly(2, &[("09:00", "12:00"), ("11:00", "13:00")])],
        ..valid()
    };
    assert_invalid(&config, "overlapping shifts on isoWeekDay 2");
}

#[test]
fn weekday_out_of_range() {
    let config = Configuration {
        available_periods: vec![weekly(8, &[("09:00", "12:00")])],
        ..valid()
    };
    assert_invalid(&config, "isoWeekDay");
}

#[test]
fn mixed_unavailable_period() {
    let config = Configuration {
        unavailable_periods: vec![Period::new(PeriodMoment::fixed(2020, 9, 16), PeriodMoment::recurring(9, 17))],
        ..valid()
    };
    assert_invalid(&config, "unavailablePeriods[0]");
}

#[test]
fn unavailable_period_on_impossible_date() {
    let config = Configuration {
        unavailable_periods: vec![Period::new(PeriodMoment::recurring(1, 30), PeriodMoment::recurring(2, 1))],
        ..valid()
    };
    assert_invalid(&config, "startAt is not a valid date");
}

#[test]
fn fixed_unavailable_period_ending_before_it_starts() {
    let config = Configuration {
        unavailable_periods: vec![
            Period::new(PeriodMoment::recurring(0, 1), PeriodMoment::recurring(0, 2)),
            Period::new(PeriodMoment::fixed(2020, 9, 17), PeriodMoment::fixed(2020, 9, 16)),
        ],
        ..valid()
    };
    assert_invalid(&config, "unavailablePeriods[1]: startAt is after endAt");
}

#[test]
fn notice_longer_than_horizon() {
    let config = Configuration {
        min_time_before_first_slot: Some(3 * 24 * 60),
        max_days_before_last_slot: Some(2),
        ..valid()
    };
    assert_invalid(&config, "exceeds maxDaysBeforeLastSlot");
}
