//! Appointment persistence boundary.
//!
//! The engine never talks to storage. Callers read bookings through
//! [`AppointmentStore`] on every query and commit through
//! [`AppointmentStore::insert`], which must check and insert atomically: the
//! engine's answer is only a hint, and two clients may both have been shown
//! the same free slot.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::booking::{Booking, BookingStatus};
use crate::error::StoreError;

/// Identifier assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(pub u64);

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which booking surface created an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingSource {
    #[default]
    Chatbot,
    Manual,
}

/// A stored appointment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: String,
    #[serde(with = "crate::time::ymd")]
    pub date: NaiveDate,
    #[serde(with = "crate::time::hhmm")]
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub procedure: Option<String>,
    pub reason: Option<String>,
    pub status: BookingStatus,
    pub source: BookingSource,
    pub created_at: DateTime<Utc>,
}

impl From<&Appointment> for Booking {
    fn from(a: &Appointment) -> Self {
        Booking::new(a.start_time, a.duration_minutes, a.status)
    }
}

/// Fields supplied by the booking flow; the store fills in id, status, and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub patient_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub procedure: Option<String>,
    pub reason: Option<String>,
    pub source: BookingSource,
}

impl NewAppointment {
    fn as_booking(&self) -> Booking {
        Booking::new(self.start_time, self.duration_minutes, BookingStatus::Pending)
    }
}

/// Source of truth for what is already booked.
pub trait AppointmentStore: Send + Sync {
    /// All bookings on `day`, of any status, exactly as stored.
    fn query_bookings_for_date(&self, day: NaiveDate) -> Result<Vec<Booking>, StoreError>;

    /// Atomically verify the slot is still free and record a pending appointment.
    ///
    /// Fails with `SlotTaken` when the new interval overlaps an occupying
    /// appointment on the same day, and with `PatientConflict` when the
    /// patient already holds an occupying appointment at the same start.
    fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError>;

    /// Change an appointment's status.
    ///
    /// Fails with `InvalidTransition` unless the change is allowed by
    /// [`BookingStatus::can_transition_to`]; in particular a rejected or
    /// cancelled appointment never occupies time again.
    fn update_status(&self, id: AppointmentId, status: BookingStatus) -> Result<Appointment, StoreError>;

    /// The patient's appointment with the latest date and start time.
    fn latest_for_patient(&self, patient_id: &str) -> Result<Option<Appointment>, StoreError>;
}

/// Mutex-guarded in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    appointments: Vec<Appointment>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `day` with existing bookings, bypassing the conflict check.
    ///
    /// Imported records are taken as the store's history, overlaps included.
    pub fn with_bookings(day: NaiveDate, bookings: &[Booking]) -> Self {
        let store = Self::new();
        store.seed(day, bookings);
        store
    }

    /// Append existing bookings for `day` without the conflict check.
    pub fn seed(&self, day: NaiveDate, bookings: &[Booking]) {
        let mut inner = self.inner.lock();
        for b in bookings {
            let id = inner.allocate_id();
            inner.appointments.push(Appointment {
                id,
                patient_id: String::new(),
                date: day,
                start_time: b.start_time,
                duration_minutes: b.duration_minutes,
                procedure: None,
                reason: None,
                status: b.status,
                source: BookingSource::Manual,
                created_at: Utc::now(),
            });
        }
        tracing::debug!(date = %day, count = bookings.len(), "seeded bookings");
    }

    pub fn len(&self) -> usize {
        self.inner.lock().appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Inner {
    fn allocate_id(&mut self) -> AppointmentId {
        self.next_id += 1;
        AppointmentId(self.next_id)
    }
}

impl AppointmentStore for InMemoryStore {
    fn query_bookings_for_date(&self, day: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .appointments
            .iter()
            .filter(|a| a.date == day)
            .map(Booking::from)
            .collect())
    }

    fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        // Check and insert under one lock so concurrent commits serialize.
        let mut inner = self.inner.lock();

        let patient_clash = inner.appointments.iter().any(|a| {
            a.patient_id == new.patient_id
                && a.date == new.date
                && a.start_time == new.start_time
                && a.status.occupies_slot()
        });
        if patient_clash {
            tracing::warn!(patient = %new.patient_id, date = %new.date, "patient double booking rejected");
            return Err(StoreError::PatientConflict {
                patient_id: new.patient_id,
                date: new.date,
                start: new.start_time,
            });
        }

        let requested = new.as_booking().occupied_interval(new.date);
        let slot_clash = requested.is_some_and(|req| {
            inner
                .appointments
                .iter()
                .filter(|a| a.date == new.date)
                .filter_map(|a| Booking::from(a).occupied_interval(a.date))
                .any(|busy| busy.overlaps(&req))
        });
        if slot_clash {
            tracing::warn!(date = %new.date, start = %new.start_time.format("%H:%M"), "slot already taken");
            return Err(StoreError::SlotTaken {
                date: new.date,
                start: new.start_time,
            });
        }

        let id = inner.allocate_id();
        let appointment = Appointment {
            id,
            patient_id: new.patient_id,
            date: new.date,
            start_time: new.start_time,
            duration_minutes: new.duration_minutes,
            procedure: new.procedure,
            reason: new.reason,
            status: BookingStatus::Pending,
            source: new.source,
            created_at: Utc::now(),
        };
        inner.appointments.push(appointment.clone());
        tracing::info!(id = %id, date = %appointment.date, "appointment recorded");
        Ok(appointment)
    }

    fn update_status(&self, id: AppointmentId, status: BookingStatus) -> Result<Appointment, StoreError> {
        let mut inner = self.inner.lock();
        let appointment = inner
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if !appointment.status.can_transition_to(status) {
            tracing::warn!(id = %id, from = %appointment.status, to = %status, "status change refused");
            return Err(StoreError::InvalidTransition {
                id,
                from: appointment.status,
                to: status,
            });
        }
        appointment.status = status;
        Ok(appointment.clone())
    }

    fn latest_for_patient(&self, patient_id: &str) -> Result<Option<Appointment>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .max_by_key(|a| (a.date, a.start_time, a.id))
            .cloned())
    }
}
