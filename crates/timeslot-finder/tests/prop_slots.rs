//! Property-based tests for the slot search using proptest.
//!
//! These tests check invariants that should hold for *any* configuration,
//! not just the fixtures in `finder_tests.rs`. Windows are placed around the
//! 2025 DST transitions on purpose.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;
use timeslot_finder::dst;
use timeslot_finder::{
    search, AvailablePeriod, Configuration, FinderError, Period, PeriodMoment, Shift, SlotSearch,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_timezone() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("UTC".to_string()),
        Just("Europe/Paris".to_string()),
        Just("America/New_York".to_string()),
        Just("Asia/Kolkata".to_string()),
        Just("Australia/Lord_Howe".to_string()),
    ]
}

/// A Monday close to a DST transition, or a quiet one in June.
fn arb_base_date() -> impl Strategy<Value = NaiveDate> {
    (
        prop_oneof![
            Just(NaiveDate::from_ymd_opt(2025, 3, 24).unwrap()),
            Just(NaiveDate::from_ymd_opt(2025, 6, 9).unwrap()),
            Just(NaiveDate::from_ymd_opt(2025, 10, 20).unwrap()),
            Just(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()),
        ],
        0u64..10,
    )
        .prop_map(|(date, offset)| date + chrono::Days::new(offset))
}

/// Weekly shifts as (isoWeekDay, start minute, length in minutes).
fn arb_shifts() -> impl Strategy<Value = Vec<(u32, u32, u32)>> {
    prop::collection::vec((1u32..=7, 0u32..=22 * 60, 15u32..=300), 1..6)
}

/// Busy periods as (day offset, local start minute, length in minutes).
fn arb_busy() -> impl Strategy<Value = Vec<(u64, u32, u32)>> {
    prop::collection::vec((0u64..10, 0u32..24 * 60, 5u32..=360), 0..12)
}

#[derive(Debug, Clone)]
struct Scenario {
    config: Configuration,
    tz: Tz,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    now: DateTime<Utc>,
    busy: Vec<(NaiveDateTime, NaiveDateTime)>,
}

prop_compose! {
    fn arb_scenario()(
        tz_name in arb_timezone(),
        base in arb_base_date(),
        duration in 5u32..=120,
        step in 1u32..=30,
        (before, after) in (0u32..=30, 0u32..=30),
        min_first in prop::option::of(0u32..=600),
        max_days in prop::option::of(0u32..=10),
        shifts in arb_shifts(),
        busy in arb_busy(),
        (from_minute, window_days) in (0i64..24 * 60, 1i64..=7),
        now_offset_hours in -48i64..=48,
    ) -> Scenario {
        let tz: Tz = tz_name.parse().unwrap();

        let mut available_periods: Vec<AvailablePeriod> = Vec::new();
        for (iso_week_day, start, length) in shifts {
            let end = (start + length).min(23 * 60 + 59);
            let shift = Shift::new(minute_of_day(start), minute_of_day(end));
            match available_periods.iter_mut().find(|p| p.iso_week_day == iso_week_day) {
                Some(period) => period.shifts.push(shift),
                None => available_periods.push(AvailablePeriod { iso_week_day, shifts: vec![shift] }),
            }
        }

        let busy: Vec<(NaiveDateTime, NaiveDateTime)> = busy
            .into_iter()
            .map(|(day, start, length)| {
                let start = (base + chrono::Days::new(day)).and_time(minute_of_day(start));
                (start, start + Duration::minutes(i64::from(length)))
            })
            .collect();

        let config = Configuration {
            available_periods,
            slot_start_minute_step: Some(step),
            min_available_time_before_slot: Some(before),
            min_available_time_after_slot: Some(after),
            min_time_before_first_slot: min_first,
            max_days_before_last_slot: max_days,
            unavailable_periods: busy.iter().map(|(s, e)| Period::new(fixed(*s), fixed(*e))).collect(),
            ..Configuration::new(duration, tz_name)
        };

        let from = dst::start_of_day(&tz, base) + Duration::minutes(from_minute);
        let to = from + Duration::days(window_days);
        let now = from + Duration::hours(now_offset_hours);

        Scenario { config, tz, from, to, now, busy }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn minute_of_day(minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap()
}

fn fixed(local: NaiveDateTime) -> PeriodMoment {
    use chrono::Datelike;
    PeriodMoment::fixed(local.year(), local.month0(), local.day()).at(local.hour(), local.minute())
}

fn run(scenario: &Scenario) -> SlotSearch {
    search(&scenario.config, scenario.from, scenario.to, scenario.now).unwrap()
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: Every slot lasts exactly the configured duration
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_have_configured_duration(scenario in arb_scenario()) {
        let result = run(&scenario);
        let expected = Duration::minutes(i64::from(scenario.config.time_slot_duration));
        for slot in &result.slots {
            prop_assert_eq!(slot.end_at - slot.start_at, expected);
            prop_assert_eq!(slot.duration, scenario.config.time_slot_duration);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: Slots are strictly ordered and never overlap
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_are_ordered_and_disjoint(scenario in arb_scenario()) {
        let result = run(&scenario);
        for pair in result.slots.windows(2) {
            prop_assert!(
                pair[0].end_at <= pair[1].start_at,
                "overlapping slots: {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: Slots stay inside the effective window
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_stay_inside_effective_window(scenario in arb_scenario()) {
        let result = run(&scenario);
        for slot in &result.slots {
            prop_assert!(slot.start_at >= result.first_from, "{:?} before {}", slot, result.first_from);
            prop_assert!(slot.end_at <= result.last_to, "{:?} after {}", slot, result.last_to);
            prop_assert!(slot.start_at >= scenario.now);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: Buffers never touch a busy period
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn buffers_keep_clear_of_busy_periods(scenario in arb_scenario()) {
        let result = run(&scenario);
        let before = scenario.config.buffer_before();
        let after = scenario.config.buffer_after();

        let busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = scenario
            .busy
            .iter()
            .map(|(s, e)| (dst::resolve_forward(&scenario.tz, *s), dst::resolve_forward(&scenario.tz, *e)))
            // A period squeezed by a DST gap can come out inverted; the search drops those.
            .filter(|(s, e)| s <= e)
            .collect();

        for slot in &result.slots {
            let claimed = (slot.start_at - before, slot.end_at + after);
            for (start, end) in &busy {
                prop_assert!(
                    !(*start < claimed.1 && *end > claimed.0),
                    "slot {:?} with buffers collides with busy {} - {}",
                    slot,
                    start,
                    end
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: Slot starts fall on the local minute step
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slot_starts_are_aligned(scenario in arb_scenario()) {
        let result = run(&scenario);
        let step = scenario.config.slot_start_minute_step();
        for slot in &result.slots {
            let minute = slot.start_at.with_timezone(&scenario.tz).minute();
            prop_assert_eq!(minute % step, 0, "{:?} not aligned on {}", slot, step);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 6: Identical inputs give identical output
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn search_is_deterministic(scenario in arb_scenario()) {
        prop_assert_eq!(run(&scenario), run(&scenario));
    }
}

// ---------------------------------------------------------------------------
// Property 7: An inverted window is always rejected
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn inverted_window_is_rejected(scenario in arb_scenario(), gap in 1i64..=10_000) {
        let to = scenario.from - Duration::minutes(gap);
        let result = search(&scenario.config, scenario.from, to, scenario.now);
        prop_assert!(matches!(result, Err(FinderError::InvalidWindow(_))));
    }
}
