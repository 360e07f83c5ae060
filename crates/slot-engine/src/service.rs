//! Booking flow on top of the engine and an appointment store.
//!
//! Every availability query reads the store afresh. Commits re-run the engine
//! against a fresh read before handing the insert to the store, whose own
//! atomic check is the final word.

use chrono::{NaiveDate, NaiveTime};

use crate::booking::BookingStatus;
use crate::config::ScheduleConfig;
use crate::engine::available_start_times;
use crate::error::{BookingError, SlotError, StoreError};
use crate::store::{Appointment, AppointmentId, AppointmentStore, BookingSource, NewAppointment};

/// A request to book one appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub patient_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub procedure: Option<String>,
    pub reason: Option<String>,
    pub source: BookingSource,
}

/// Availability queries and guarded commits for one clinic schedule.
#[derive(Debug)]
pub struct BookingService<S> {
    config: ScheduleConfig,
    store: S,
}

impl<S: AppointmentStore> BookingService<S> {
    /// Wrap `store` with a schedule, rejecting a malformed schedule up front.
    pub fn new(config: ScheduleConfig, store: S) -> Result<Self, SlotError> {
        config.validate()?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start times on `day` that currently fit `duration_minutes`.
    ///
    /// # Errors
    /// `AvailabilityUnknown` when the store cannot be read; `Slot` for a bad
    /// duration.
    pub fn available_slots(
        &self,
        day: NaiveDate,
        duration_minutes: i64,
    ) -> Result<Vec<NaiveTime>, BookingError> {
        if duration_minutes <= 0 {
            return Err(SlotError::InvalidInput(format!(
                "duration must be positive, got {} minutes",
                duration_minutes
            ))
            .into());
        }

        let existing = self.store.query_bookings_for_date(day).map_err(|e| {
            tracing::warn!(%day, error = %e, "could not read bookings");
            BookingError::AvailabilityUnknown(e)
        })?;
        tracing::debug!(%day, duration_minutes, existing = existing.len(), "querying availability");

        Ok(available_start_times(
            day,
            duration_minutes,
            &self.config,
            &existing,
        )?)
    }

    /// Book `request` if its start time is still offered, as of `today`.
    pub fn book(&self, request: BookingRequest, today: NaiveDate) -> Result<Appointment, BookingError> {
        if request.date < today {
            return Err(BookingError::PastDate(request.date));
        }

        let offered = self.available_slots(request.date, request.duration_minutes)?;
        if !offered.contains(&request.start_time) {
            tracing::debug!(
                date = %request.date,
                start = %request.start_time.format("%H:%M"),
                "requested start not offered"
            );
            return Err(BookingError::NotOffered {
                date: request.date,
                start: request.start_time,
            });
        }

        let appointment = self
            .store
            .insert(NewAppointment {
                patient_id: request.patient_id,
                date: request.date,
                start_time: request.start_time,
                duration_minutes: request.duration_minutes,
                procedure: request.procedure,
                reason: request.reason,
                source: request.source,
            })
            .map_err(|e| match e {
                StoreError::Unavailable(_) => BookingError::AvailabilityUnknown(e),
                other => BookingError::Store(other),
            })?;

        tracing::info!(
            id = %appointment.id,
            date = %appointment.date,
            start = %appointment.start_time.format("%H:%M"),
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Move an appointment to `status`; rejecting or cancelling frees its time.
    pub fn set_status(&self, id: AppointmentId, status: BookingStatus) -> Result<Appointment, BookingError> {
        let appointment = self.store.update_status(id, status).map_err(BookingError::Store)?;
        tracing::info!(id = %id, status = %status, "appointment status changed");
        Ok(appointment)
    }
}
