//! Clinic schedule configuration and TOML loading.
//!
//! Settings come from a TOML file selected by:
//! 1. an explicit path (the CLI's `--config <path>`)
//! 2. the `CLINIC_CONFIG` environment variable
//! 3. otherwise, built-in defaults
//!
//! ```toml
//! [schedule]
//! work_start = "09:00"
//! lunch_start = "13:00"
//! lunch_end = "14:00"
//! work_end = "18:00"
//! step_minutes = 15
//!
//! [clinic]
//! name = "MedBot Dental Clinic"
//! ```

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, SlotError};

/// Environment variable consulted when no explicit config path is given.
pub const CONFIG_ENV_VAR: &str = "CLINIC_CONFIG";

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Working hours, lunch break, and candidate granularity for one clinic day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    #[serde(with = "crate::time::hhmm")]
    pub work_start: NaiveTime,
    #[serde(with = "crate::time::hhmm")]
    pub lunch_start: NaiveTime,
    #[serde(with = "crate::time::hhmm")]
    pub lunch_end: NaiveTime,
    #[serde(with = "crate::time::hhmm")]
    pub work_end: NaiveTime,
    pub step_minutes: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            work_start: hm(9, 0),
            lunch_start: hm(13, 0),
            lunch_end: hm(14, 0),
            work_end: hm(18, 0),
            step_minutes: 15,
        }
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

impl ScheduleConfig {
    /// Build a validated schedule.
    pub fn new(
        work_start: NaiveTime,
        lunch_start: NaiveTime,
        lunch_end: NaiveTime,
        work_end: NaiveTime,
        step_minutes: i64,
    ) -> Result<Self, SlotError> {
        let config = Self {
            work_start,
            lunch_start,
            lunch_end,
            work_end,
            step_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check `work_start < lunch_start < lunch_end < work_end` and a step between one minute and one day.
    pub fn validate(&self) -> Result<(), SlotError> {
        let ordered = self.work_start < self.lunch_start
            && self.lunch_start < self.lunch_end
            && self.lunch_end < self.work_end;
        if !ordered {
            return Err(SlotError::InvalidConfig(format!(
                "expected work_start < lunch_start < lunch_end < work_end, got {} / {} / {} / {}",
                self.work_start.format("%H:%M"),
                self.lunch_start.format("%H:%M"),
                self.lunch_end.format("%H:%M"),
                self.work_end.format("%H:%M"),
            )));
        }
        if self.step_minutes <= 0 || self.step_minutes > MINUTES_PER_DAY {
            return Err(SlotError::InvalidConfig(format!(
                "step_minutes must be between 1 and {}, got {}",
                MINUTES_PER_DAY,
                self.step_minutes
            )));
        }
        Ok(())
    }

    /// Bookable minutes in a day, lunch excluded.
    pub fn working_minutes(&self) -> i64 {
        (self.lunch_start - self.work_start).num_minutes()
            + (self.work_end - self.lunch_end).num_minutes()
    }
}

/// Public-facing clinic details shown by the booking assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicInfo {
    pub name: String,
    pub doctor: String,
    pub timings: String,
    pub services: Vec<String>,
}

impl Default for ClinicInfo {
    fn default() -> Self {
        Self {
            name: "MedBot Dental Clinic".to_string(),
            doctor: "Dr. MedBot (Dental Surgeon)".to_string(),
            timings: "Monday to Saturday, 9:00 AM - 6:00 PM".to_string(),
            services: [
                "General checkups",
                "Dental cleaning & scaling",
                "Fillings",
                "Extractions",
                "Root canal treatment",
                "Minor dental procedures",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Everything loaded at startup and injected into the service layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub schedule: ScheduleConfig,
    pub clinic: ClinicInfo,
}

impl Settings {
    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(text)?;
        settings.schedule.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolve settings from an explicit path, then `CLINIC_CONFIG`, then defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "loading clinic config");
            return Self::from_file(path);
        }
        match env::var(CONFIG_ENV_VAR) {
            Ok(from_env) if !from_env.is_empty() => {
                tracing::debug!(path = %from_env, "loading clinic config from {}", CONFIG_ENV_VAR);
                Self::from_file(Path::new(&from_env))
            }
            _ => {
                tracing::debug!("no clinic config given, using defaults");
                Ok(Self::default())
            }
        }
    }
}
