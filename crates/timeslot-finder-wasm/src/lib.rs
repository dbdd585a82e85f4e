//! WASM bindings for timeslot-finder.
//!
//! Exposes the slot search and configuration validation to JavaScript via
//! `wasm-bindgen`. Requests and results cross the boundary as JSON strings in
//! the same camelCase shape the library's serde types use.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p timeslot-finder-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/timeslot-finder-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/timeslot_finder_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use timeslot_finder::{validate_configuration, Configuration, SearchRequest, TimeSlot};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

/// Instants are rendered with milliseconds, the way JavaScript's
/// `Date.prototype.toISOString` does.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeSlotDto {
    start_at: String,
    end_at: String,
    duration: u32,
}

impl From<&TimeSlot> for TimeSlotDto {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            start_at: to_iso_string(slot.start_at),
            end_at: to_iso_string(slot.end_at),
            duration: slot.duration,
        }
    }
}

fn to_iso_string(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// ---------------------------------------------------------------------------
// Helper: parse an ISO 8601 string into a UTC DateTime
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (with offset) and naive datetimes, which are read as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

// ---------------------------------------------------------------------------
// JSON-level operations, kept free of `JsValue` so they run natively in tests
// ---------------------------------------------------------------------------

fn available_time_slots(request_json: &str, now: Option<&str>) -> Result<String, String> {
    let request = SearchRequest::from_json(request_json).map_err(|e| e.to_string())?;
    let now = match now {
        Some(now) => parse_datetime(now)?,
        None => Utc::now(),
    };

    let slots = request.run(now).map_err(|e| e.to_string())?;
    let dtos: Vec<TimeSlotDto> = slots.iter().map(TimeSlotDto::from).collect();

    serde_json::to_string(&dtos).map_err(|e| format!("Serialization error: {}", e))
}

fn configuration_valid(config_json: &str) -> Result<bool, String> {
    let config: Configuration =
        serde_json::from_str(config_json).map_err(|e| format!("Invalid configuration JSON: {}", e))?;
    validate_configuration(&config).map_err(|e| e.to_string())?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Search the bookable slots of a request.
///
/// `request_json` is `{configuration, from, to}`. `now` is an optional ISO
/// 8601 instant and defaults to the current time. Returns a JSON array of
/// `{startAt, endAt, duration}` objects.
#[wasm_bindgen(js_name = "getAvailableTimeSlots")]
pub fn get_available_time_slots(request_json: &str, now: Option<String>) -> Result<String, JsValue> {
    available_time_slots(request_json, now.as_deref()).map_err(|e| JsValue::from_str(&e))
}

/// Validate a configuration. Returns `true`, or throws with the reason.
#[wasm_bindgen(js_name = "isConfigurationValid")]
pub fn is_configuration_valid(config_json: &str) -> Result<bool, JsValue> {
    configuration_valid(config_json).map_err(|e| JsValue::from_str(&e))
}
