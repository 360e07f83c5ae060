//! The booking projection the engine reads from an appointment store.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::interval::TimeInterval;

/// Length assumed for a booking whose stored duration is missing or non-positive.
pub const DEFAULT_BOOKING_MINUTES: i64 = 30;

/// Upper bound applied to stored durations before interval arithmetic.
const MAX_BOOKING_MINUTES: i64 = 24 * 60;

/// Lifecycle status of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
    Emergency,
}

impl BookingStatus {
    /// Only pending and approved appointments hold their time.
    pub fn occupies_slot(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }

    /// Allowed status changes. Nothing leaves a terminal status, so an
    /// appointment that released its time can never reclaim it.
    pub fn can_transition_to(self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Pending, Approved | Rejected | Cancelled) | (Approved, Cancelled | Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::Emergency => "emergency",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "approved" => Ok(BookingStatus::Approved),
            "rejected" => Ok(BookingStatus::Rejected),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            "emergency" => Ok(BookingStatus::Emergency),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

/// Read-only view of an existing appointment on the queried day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(with = "crate::time::hhmm")]
    pub start_time: NaiveTime,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
    #[serde(default)]
    pub status: BookingStatus,
}

fn default_duration() -> i64 {
    DEFAULT_BOOKING_MINUTES
}

impl Booking {
    pub fn new(start_time: NaiveTime, duration_minutes: i64, status: BookingStatus) -> Self {
        Self {
            start_time,
            duration_minutes,
            status,
        }
    }

    /// Duration used for overlap checks, after defaulting and clamping.
    pub fn effective_minutes(&self) -> i64 {
        if self.duration_minutes <= 0 {
            DEFAULT_BOOKING_MINUTES
        } else {
            self.duration_minutes.min(MAX_BOOKING_MINUTES)
        }
    }

    /// The interval this booking blocks on `day`, or `None` when its status is inert.
    pub fn occupied_interval(&self, day: NaiveDate) -> Option<TimeInterval> {
        if !self.status.occupies_slot() {
            return None;
        }
        let start = day.and_time(self.start_time);
        Some(TimeInterval::new(
            start,
            start + Duration::minutes(self.effective_minutes()),
        ))
    }
}
