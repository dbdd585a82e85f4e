//! Configuration and result types.
//!
//! The serde shape matches the JSON accepted by the booking widgets that
//! consume this crate: camelCase field names, `"HH:mm"` shift times, and
//! zero-indexed months in [`PeriodMoment`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::Result;

/// A calendar moment that may omit its year.
///
/// `month` is **zero-indexed** (0 = January, 11 = December), both on the wire
/// and in this type. The conversion to a real calendar month happens only in
/// [`PeriodMoment::local_datetime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireMoment", into = "WireMoment")]
pub enum PeriodMoment {
    /// An absolute moment in a given year.
    Fixed {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },
    /// The same month/day/time every year.
    Recurring {
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },
}

impl PeriodMoment {
    /// Midnight of `day` in zero-indexed `month` of `year`.
    pub fn fixed(year: i32, month: u32, day: u32) -> Self {
        PeriodMoment::Fixed {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
        }
    }

    /// Midnight of `day` in zero-indexed `month`, every year.
    pub fn recurring(month: u32, day: u32) -> Self {
        PeriodMoment::Recurring {
            month,
            day,
            hour: 0,
            minute: 0,
        }
    }

    /// The same moment at `hour:minute`.
    pub fn at(self, hour: u32, minute: u32) -> Self {
        match self {
            PeriodMoment::Fixed {
                year, month, day, ..
            } => PeriodMoment::Fixed {
                year,
                month,
                day,
                hour,
                minute,
            },
            PeriodMoment::Recurring { month, day, .. } => PeriodMoment::Recurring {
                month,
                day,
                hour,
                minute,
            },
        }
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            PeriodMoment::Fixed { year, .. } => Some(*year),
            PeriodMoment::Recurring { .. } => None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, PeriodMoment::Recurring { .. })
    }

    /// The local wall-clock time of this moment.
    ///
    /// A fixed moment ignores `year`; a recurring one is placed in it.
    /// Returns `None` when the fields do not name a real date or time
    /// (month 12, February 30, hour 24, ...).
    pub fn local_datetime(&self, year: i32) -> Option<NaiveDateTime> {
        let (year, month, day, hour, minute) = match *self {
            PeriodMoment::Fixed {
                year,
                month,
                day,
                hour,
                minute,
            } => (year, month, day, hour, minute),
            PeriodMoment::Recurring {
                month,
                day,
                hour,
                minute,
            } => (year, month, day, hour, minute),
        };
        let date = NaiveDate::from_ymd_opt(year, month.checked_add(1)?, day)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        Some(date.and_time(time))
    }
}

#[derive(Serialize, Deserialize)]
struct WireMoment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    month: u32,
    day: u32,
    #[serde(default)]
    hour: Option<u32>,
    #[serde(default)]
    minute: Option<u32>,
}

impl From<WireMoment> for PeriodMoment {
    fn from(w: WireMoment) -> Self {
        let hour = w.hour.unwrap_or(0);
        let minute = w.minute.unwrap_or(0);
        match w.year {
            Some(year) => PeriodMoment::Fixed {
                year,
                month: w.month,
                day: w.day,
                hour,
                minute,
            },
            None => PeriodMoment::Recurring {
                month: w.month,
                day: w.day,
                hour,
                minute,
            },
        }
    }
}

impl From<PeriodMoment> for WireMoment {
    fn from(m: PeriodMoment) -> Self {
        match m {
            PeriodMoment::Fixed {
                year,
                month,
                day,
                hour,
                minute,
            } => WireMoment {
                year: Some(year),
                month,
                day,
                hour: Some(hour),
                minute: Some(minute),
            },
            PeriodMoment::Recurring {
                month,
                day,
                hour,
                minute,
            } => WireMoment {
                year: None,
                month,
                day,
                hour: Some(hour),
                minute: Some(minute),
            },
        }
    }
}

/// A period during which booking is impossible. Takes precedence over shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_at: PeriodMoment,
    /// When `start_at` carries a year, this should carry one too.
    pub end_at: PeriodMoment,
}

impl Period {
    pub fn new(start_at: PeriodMoment, end_at: PeriodMoment) -> Self {
        Self { start_at, end_at }
    }
}

/// A bookable time-of-day range inside a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[serde(with = "hh_mm")]
    pub start_time: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end_time: NaiveTime,
}

impl Shift {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Build a shift from two `"HH:mm"` strings.
    ///
    /// # Errors
    /// Returns `FinderError::InvalidConfiguration` if either string is not a valid time.
    pub fn parse(start_time: &str, end_time: &str) -> Result<Self> {
        Ok(Self {
            start_time: hh_mm::parse(start_time)?,
            end_time: hh_mm::parse(end_time)?,
        })
    }
}

/// The shifts offered on one ISO weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailablePeriod {
    /// 1 for Monday through 7 for Sunday.
    pub iso_week_day: u32,
    pub shifts: Vec<Shift>,
}

/// The rules used to search availabilities. All durations are in minutes.
///
/// Defaults for the optional fields are applied by the accessors in
/// [`crate::config`], never by mutating the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Duration of an appointment.
    pub time_slot_duration: u32,
    /// The weekly template of bookable shifts.
    pub available_periods: Vec<AvailablePeriod>,
    /// Slots may only start on local minutes that are multiples of this step
    /// (15 allows XX:00, XX:15, XX:30 and XX:45). Defaults to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_start_minute_step: Option<u32>,
    #[serde(default)]
    pub unavailable_periods: Vec<Period>,
    /// Free time required before each slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_available_time_before_slot: Option<u32>,
    /// Free time required after each slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_available_time_after_slot: Option<u32>,
    /// Minimum notice between "now" and the first bookable slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_time_before_first_slot: Option<u32>,
    /// Days ahead of "now" after which nothing can be booked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_days_before_last_slot: Option<u32>,
    /// IANA timezone every wall-clock time in this configuration is read in.
    pub time_zone: String,
    #[serde(default)]
    pub dst_gap_policy: DstPolicy,
}

impl Configuration {
    /// A configuration with no shifts, no busy periods and every optional rule unset.
    pub fn new(time_slot_duration: u32, time_zone: impl Into<String>) -> Self {
        Self {
            time_slot_duration,
            available_periods: Vec::new(),
            slot_start_minute_step: None,
            unavailable_periods: Vec::new(),
            min_available_time_before_slot: None,
            min_available_time_after_slot: None,
            min_time_before_first_slot: None,
            max_days_before_last_slot: None,
            time_zone: time_zone.into(),
            dst_gap_policy: DstPolicy::default(),
        }
    }
}

/// A bookable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Always the configured `time_slot_duration`, in minutes.
    pub duration: u32,
}

mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::error::{FinderError, Result};

    const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(s, FORMAT)
            .map_err(|e| FinderError::InvalidConfiguration(format!("invalid shift time '{}': {}", s, e)))
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }
}
