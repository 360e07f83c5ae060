//! Tests for the booking service: fresh reads, guarded commits, outages.

use chrono::{NaiveDate, NaiveTime};
use slot_engine::{
    Appointment, AppointmentId, AppointmentStore, Booking, BookingError, BookingRequest, BookingService,
    BookingSource, BookingStatus, InMemoryStore, NewAppointment, ScheduleConfig, SlotError, StoreError,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

fn t(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn service() -> BookingService<InMemoryStore> {
    BookingService::new(ScheduleConfig::default(), InMemoryStore::new()).unwrap()
}

fn request(patient: &str, start: &str, minutes: i64) -> BookingRequest {
    BookingRequest {
        patient_id: patient.to_string(),
        date: day(),
        start_time: t(start),
        duration_minutes: minutes,
        procedure: Some("Cleaning / Scaling".to_string()),
        reason: None,
        source: BookingSource::Manual,
    }
}

/// A store whose backend is down.
struct DownStore;

impl AppointmentStore for DownStore {
    fn query_bookings_for_date(&self, _day: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn insert(&self, _new: NewAppointment) -> Result<Appointment, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn update_status(&self, id: AppointmentId, _status: BookingStatus) -> Result<Appointment, StoreError> {
        Err(StoreError::NotFound(id))
    }

    fn latest_for_patient(&self, _patient_id: &str) -> Result<Option<Appointment>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

// ── Availability ────────────────────────────────────────────────────────────

#[test]
fn availability_reflects_each_commit_immediately() {
    let svc = service();
    assert!(svc.available_slots(day(), 30).unwrap().contains(&t("10:00")));

    svc.book(request("p1", "10:00", 30), today()).unwrap();

    let after = svc.available_slots(day(), 30).unwrap();
    assert!(!after.contains(&t("10:00")));
    assert!(!after.contains(&t("09:45")));
    assert!(after.contains(&t("09:30")));
    assert!(after.contains(&t("10:30")));
}

#[test]
fn store_outage_is_availability_unknown_not_empty() {
    let svc = BookingService::new(ScheduleConfig::default(), DownStore).unwrap();

    let err = svc.available_slots(day(), 30).unwrap_err();
    assert!(matches!(err, BookingError::AvailabilityUnknown(_)), "{:?}", err);
}

#[test]
fn bad_duration_is_rejected_before_touching_the_store() {
    let svc = BookingService::new(ScheduleConfig::default(), DownStore).unwrap();

    let err = svc.available_slots(day(), 0).unwrap_err();
    assert!(matches!(err, BookingError::Slot(SlotError::InvalidInput(_))), "{:?}", err);
}

#[test]
fn malformed_schedule_is_rejected_at_construction() {
    let config = ScheduleConfig {
        step_minutes: 0,
        ..ScheduleConfig::default()
    };
    assert!(matches!(
        BookingService::new(config, InMemoryStore::new()),
        Err(SlotError::InvalidConfig(_))
    ));
}

// ── Booking ─────────────────────────────────────────────────────────────────

#[test]
fn booking_records_a_pending_appointment() {
    let svc = service();
    let appt = svc.book(request("p1", "11:00", 30), today()).unwrap();

    assert_eq!(appt.status, BookingStatus::Pending);
    assert_eq!(appt.start_time, t("11:00"));
    assert_eq!(appt.source, BookingSource::Manual);
    assert_eq!(svc.store().len(), 1);
}

#[test]
fn booking_in_the_past_is_rejected() {
    let svc = service();
    let later_today = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();

    let err = svc.book(request("p1", "11:00", 30), later_today).unwrap_err();
    assert_eq!(err, BookingError::PastDate(day()));
}

#[test]
fn booking_on_today_is_allowed() {
    let svc = service();
    assert!(svc.book(request("p1", "11:00", 30), day()).is_ok());
}

#[test]
fn booking_during_lunch_is_not_offered() {
    let svc = service();
    let err = svc.book(request("p1", "13:15", 30), today()).unwrap_err();

    assert!(matches!(err, BookingError::NotOffered { .. }), "{:?}", err);
    assert!(err.is_conflict());
}

#[test]
fn booking_off_grid_is_not_offered() {
    let svc = service();
    let err = svc.book(request("p1", "10:07", 30), today()).unwrap_err();
    assert!(matches!(err, BookingError::NotOffered { .. }));
}

#[test]
fn second_booking_for_taken_slot_fails() {
    let svc = service();
    svc.book(request("p1", "10:00", 60), today()).unwrap();

    let err = svc.book(request("p2", "10:30", 30), today()).unwrap_err();
    assert!(err.is_conflict(), "{:?}", err);
    assert_eq!(svc.store().len(), 1);
}

#[test]
fn rejecting_an_appointment_reopens_the_slot() {
    let svc = service();
    let appt = svc.book(request("p1", "10:00", 30), today()).unwrap();

    svc.set_status(appt.id, BookingStatus::Rejected).unwrap();

    assert!(svc.available_slots(day(), 30).unwrap().contains(&t("10:00")));
    assert!(svc.book(request("p2", "10:00", 30), today()).is_ok());
}

#[test]
fn approving_keeps_the_slot_occupied() {
    let svc = service();
    let appt = svc.book(request("p1", "10:00", 30), today()).unwrap();

    let approved = svc.set_status(appt.id, BookingStatus::Approved).unwrap();
    assert_eq!(approved.status, BookingStatus::Approved);
    assert!(!svc.available_slots(day(), 30).unwrap().contains(&t("10:00")));
}

#[test]
fn commit_during_outage_is_availability_unknown() {
    let svc = BookingService::new(ScheduleConfig::default(), DownStore).unwrap();
    let err = svc.book(request("p1", "10:00", 30), today()).unwrap_err();
    assert!(matches!(err, BookingError::AvailabilityUnknown(_)));
}

#[test]
fn reopened_slot_stays_with_the_new_booking() {
    let svc = service();
    let first = svc.book(request("p1", "10:00", 30), today()).unwrap();
    svc.set_status(first.id, BookingStatus::Rejected).unwrap();
    svc.book(request("p2", "10:00", 30), today()).unwrap();

    let err = svc.set_status(first.id, BookingStatus::Approved).unwrap_err();
    assert!(
        matches!(err, BookingError::Store(StoreError::InvalidTransition { .. })),
        "{:?}",
        err
    );
    assert!(!err.is_conflict());
    assert!(err.to_string().contains("already rejected"), "{}", err);

    let occupying = svc
        .store()
        .query_bookings_for_date(day())
        .unwrap()
        .into_iter()
        .filter(|b| b.start_time == t("10:00") && b.status.occupies_slot())
        .count();
    assert_eq!(occupying, 1);
}

#[test]
fn status_change_for_unknown_appointment_is_not_found() {
    let svc = service();
    let err = svc.set_status(AppointmentId(42), BookingStatus::Approved).unwrap_err();
    assert_eq!(err, BookingError::Store(StoreError::NotFound(AppointmentId(42))));
    assert!(err.to_string().contains("42"));
}
