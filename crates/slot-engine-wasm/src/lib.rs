//! WASM bindings for slot-engine.
//!
//! Exposes start-time availability and schedule validation to JavaScript via
//! `wasm-bindgen`. Complex types cross the boundary as JSON strings: times as
//! `HH:MM`, days as `YYYY-MM-DD`.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/slot-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use serde::Serialize;
use slot_engine::{format_time, parse_date, Booking, ScheduleConfig};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct AvailabilityDto {
    date: String,
    duration_minutes: i64,
    slots: Vec<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ValidationDto {
    Valid {
        valid: bool,
        config: ScheduleConfig,
        working_minutes: i64,
    },
    Invalid {
        valid: bool,
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Plain-Rust implementations, testable off-wasm
// ---------------------------------------------------------------------------

fn parse_config_json(json: Option<&str>) -> Result<ScheduleConfig, String> {
    match json.map(str::trim) {
        None | Some("") => Ok(ScheduleConfig::default()),
        Some(json) => serde_json::from_str(json).map_err(|e| format!("Invalid config JSON: {}", e)),
    }
}

fn available_json(
    date: &str,
    duration_minutes: i64,
    bookings_json: &str,
    config_json: Option<&str>,
) -> Result<String, String> {
    let day = parse_date(date).ok_or_else(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?;
    let bookings: Vec<Booking> =
        serde_json::from_str(bookings_json).map_err(|e| format!("Invalid bookings JSON: {}", e))?;
    let config = parse_config_json(config_json)?;

    let slots = slot_engine::available_start_times(day, duration_minutes, &config, &bookings)
        .map_err(|e| e.to_string())?;

    let dto = AvailabilityDto {
        date: date.trim().to_string(),
        duration_minutes,
        slots: slots.into_iter().map(format_time).collect(),
    };
    serde_json::to_string(&dto).map_err(|e| format!("Serialization error: {}", e))
}

fn validate_json(config_json: &str) -> String {
    let dto = match parse_config_json(Some(config_json))
        .and_then(|config| config.validate().map(|_| config).map_err(|e| e.to_string()))
    {
        Ok(config) => ValidationDto::Valid {
            valid: true,
            working_minutes: config.working_minutes(),
            config,
        },
        Err(error) => ValidationDto::Invalid { valid: false, error },
    };
    serde_json::to_string(&dto).unwrap_or_else(|e| format!(r#"{{"valid":false,"error":"{}"}}"#, e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// List start times on `date` where an appointment of `duration_minutes` fits.
///
/// `bookings_json` is a JSON array of `{start_time, duration_minutes?, status?}`
/// objects for that day. `config_json` is an optional schedule object
/// (`work_start`, `lunch_start`, `lunch_end`, `work_end`, `step_minutes`);
/// missing fields take the clinic defaults. Returns
/// `{date, duration_minutes, slots}` as a JSON string.
#[wasm_bindgen(js_name = "availableStartTimes")]
pub fn available_start_times(
    date: &str,
    duration_minutes: i32,
    bookings_json: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    available_json(
        date,
        i64::from(duration_minutes),
        bookings_json,
        config_json.as_deref(),
    )
    .map_err(|e| JsValue::from_str(&e))
}

/// Check a schedule object. Returns `{valid: true, config, working_minutes}`
/// or `{valid: false, error}` as a JSON string.
#[wasm_bindgen(js_name = "validateConfig")]
pub fn validate_config(config_json: &str) -> String {
    validate_json(config_json)
}
