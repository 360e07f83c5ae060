//! Error types for slot-engine operations.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::booking::BookingStatus;
use crate::store::AppointmentId;

/// Failures of the availability engine itself.
///
/// Both variants are caller programming errors. A day with no room left is
/// an empty result, never an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid schedule config: {0}")]
    InvalidConfig(String),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] SlotError),
}

/// Errors reported by an appointment store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or answered with garbage.
    #[error("Appointment store unavailable: {0}")]
    Unavailable(String),

    /// Another occupying appointment already covers part of the requested interval.
    #[error("Slot {date} {time} is already taken", time = .start.format("%H:%M"))]
    SlotTaken { date: NaiveDate, start: NaiveTime },

    /// The patient already holds an appointment at this date and time.
    #[error("Patient {patient_id} already has an appointment at {date} {time}", time = .start.format("%H:%M"))]
    PatientConflict {
        patient_id: String,
        date: NaiveDate,
        start: NaiveTime,
    },

    #[error("Appointment {0} not found")]
    NotFound(AppointmentId),

    /// The appointment's current status does not allow the requested change.
    #[error("Appointment {id} is already {from}, cannot mark it {to}")]
    InvalidTransition {
        id: AppointmentId,
        from: BookingStatus,
        to: BookingStatus,
    },
}

/// Errors surfaced by the booking flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    Slot(#[from] SlotError),

    /// The store could not be read, so nothing is known about free time.
    /// Distinct from an empty slot list.
    #[error("Availability unknown: {0}")]
    AvailabilityUnknown(#[source] StoreError),

    #[error("Cannot book appointments in the past ({0})")]
    PastDate(NaiveDate),

    #[error("{time} is not an available start time on {date}", time = .start.format("%H:%M"))]
    NotOffered { date: NaiveDate, start: NaiveTime },

    #[error(transparent)]
    Store(StoreError),
}

impl BookingError {
    /// True when a concurrent booking won the slot between listing and commit.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BookingError::NotOffered { .. }
                | BookingError::Store(StoreError::SlotTaken { .. })
                | BookingError::Store(StoreError::PatientConflict { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, SlotError>;
