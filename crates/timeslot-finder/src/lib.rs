//! # timeslot-finder
//!
//! Deterministic search for bookable appointment slots.
//!
//! Given a weekly template of shifts, a list of busy periods and a set of
//! buffering and alignment rules, computes every fixed-duration slot that can
//! be booked within a window. All wall-clock times are read in one IANA
//! timezone via `chrono-tz`, and DST transitions are handled explicitly.
//!
//! The current instant is always an argument, so identical inputs give
//! identical output.
//!
//! ## Modules
//!
//! - [`finder`]: public entry points and the day/shift walker
//! - [`boundary`]: effective search window (lead time, booking horizon)
//! - [`unavailability`]: busy period resolution and per-day indexing
//! - [`generator`]: aligned, buffer-respecting slots inside one shift
//! - [`config`]: defaults, shift merging and static validation
//! - [`dst`]: DST gap/fold policies for wall-clock times
//! - [`types`]: configuration and result types
//! - [`error`]: error types

pub mod boundary;
pub mod config;
pub mod dst;
pub mod error;
pub mod finder;
pub mod generator;
pub mod types;
pub mod unavailability;

pub use config::{merge_overlapping_shifts, validate_configuration};
pub use dst::DstPolicy;
pub use error::FinderError;
pub use finder::{find_time_slots, search, search_in, SearchRequest, SlotSearch};
pub use types::{AvailablePeriod, Configuration, Period, PeriodMoment, Shift, TimeSlot};
