//! Slot generation inside a single shift window.
//!
//! A cursor walks the window from left to right. At each step it is aligned
//! to the next legal slot start; if the next busy interval leaves too little
//! room for the slot and its buffers, the cursor jumps past that interval,
//! otherwise a slot is emitted and the cursor moves past it.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

use crate::boundary::{ceil_to_minute, saturating_add, saturating_sub};
use crate::error::{FinderError, Result};
use crate::types::{Configuration, TimeSlot};
use crate::unavailability::BusyInterval;

/// Slot generator for one configuration, reused across every shift of a search.
#[derive(Debug, Clone)]
pub struct SlotGenerator<'a, Tz: TimeZone> {
    tz: &'a Tz,
    duration: Duration,
    duration_minutes: u32,
    before: Duration,
    window_needed: Duration,
    trailing_reach: Duration,
    // The next slot's leading buffer may overlap this slot's trailing one.
    gap_after_slot: Duration,
    step: u32,
}

impl<'a, Tz: TimeZone> SlotGenerator<'a, Tz> {
    pub fn new(config: &Configuration, tz: &'a Tz) -> Self {
        let before = config.buffer_before();
        let after = config.buffer_after();
        Self {
            tz,
            duration: config.slot_duration(),
            duration_minutes: config.time_slot_duration,
            before,
            window_needed: config.min_time_window_needed(),
            trailing_reach: config.trailing_reach(),
            gap_after_slot: (after - before).max(Duration::zero()),
            step: config.slot_start_minute_step(),
        }
    }

    /// Every slot that fits in `[from, to]`, in chronological order.
    ///
    /// `busy` must be sorted by start. Slots never start before `from`, never
    /// end after `to`, and keep their buffers clear of every interval in `busy`.
    ///
    /// # Errors
    /// Returns `FinderError::Stalled` if the search cursor fails to move
    /// forward, which only a zero-minute slot duration can cause.
    pub fn generate(
        &self,
        busy: &[BusyInterval],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>> {
        let mut slots = Vec::new();

        // The first slot keeps its leading buffer inside the window contract.
        let mut search = saturating_sub(from, self.before);
        let search_end = saturating_sub(to, self.trailing_reach);

        let mut focus = busy
            .iter()
            .position(|interval| interval.end > search)
            .unwrap_or(busy.len());

        while search <= search_end {
            let anchor = self.align(search);
            if anchor > search_end {
                break;
            }

            while focus < busy.len() && busy[focus].end <= anchor {
                focus += 1;
            }

            let next = match busy.get(focus) {
                Some(interval) if interval.start < saturating_add(anchor, self.window_needed) => {
                    focus += 1;
                    interval.end
                }
                _ => {
                    let start_at = anchor + self.before;
                    let end_at = start_at + self.duration;
                    slots.push(TimeSlot {
                        start_at,
                        end_at,
                        duration: self.duration_minutes,
                    });
                    saturating_add(end_at, self.gap_after_slot)
                }
            };

            if next <= search {
                return Err(FinderError::Stalled(search));
            }
            search = next;
        }

        Ok(slots)
    }

    /// The first cursor position at or after `moment` whose slot would start
    /// on a local minute that is a multiple of the step.
    ///
    /// The grid restarts at :00 every hour, so with a step that does not
    /// divide 60 the last gap of the hour is shorter. Only the local
    /// minute-of-hour is consulted, so a DST transition inside the window
    /// cannot move the cursor backwards.
    fn align(&self, moment: DateTime<Utc>) -> DateTime<Utc> {
        let mut next = ceil_to_minute(moment);
        loop {
            let slot_minute = (next + self.before).with_timezone(self.tz).minute();
            let on_grid = slot_minute.div_ceil(self.step) * self.step;
            // Past :59 the next grid point is the top of the hour.
            let minutes_to_add = on_grid.min(60) - slot_minute;
            if minutes_to_add == 0 {
                return next;
            }
            // Re-checked because a half-hour DST shift can land off the grid.
            next = next + Duration::minutes(i64::from(minutes_to_add));
        }
    }
}
