//! # slot-engine
//!
//! Deterministic appointment-slot availability for a single-practitioner clinic.
//!
//! Given a working day split by a lunch break and the appointments already on
//! the books, the engine lists every start time at which a new appointment of a
//! given length fits without overlapping anything. The engine is a pure
//! function; the surrounding modules supply the collaborators a booking flow
//! needs (configuration, an appointment store, and a step-wise assistant).
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use slot_engine::{available_start_times, format_time, ScheduleConfig};
//!
//! let day = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
//! let slots = available_start_times(day, 30, &ScheduleConfig::default(), &[]).unwrap();
//!
//! assert_eq!(format_time(slots[0]), "09:00");
//! assert_eq!(format_time(*slots.last().unwrap()), "17:30");
//! ```
//!
//! ## Modules
//!
//! - [`engine`] — Candidate generation with the lunch jump and conflict filtering
//! - [`interval`] — Half-open time intervals and overlap tests
//! - [`booking`] — Booking projection and appointment statuses
//! - [`config`] — Schedule configuration, clinic details, TOML loading
//! - [`time`] — `HH:MM` / `YYYY-MM-DD` parsing, formatting, serde adapters
//! - [`store`] — Appointment store trait and an in-memory implementation
//! - [`service`] — Booking flow: fresh availability reads and guarded commits
//! - [`procedure`] — Reason text → procedure and duration
//! - [`assistant`] — Step-wise booking conversation state machine
//! - [`error`] — Error types

pub mod assistant;
pub mod booking;
pub mod config;
pub mod engine;
pub mod error;
pub mod interval;
pub mod procedure;
pub mod service;
pub mod store;
pub mod time;

pub use assistant::{BookingAssistant, BookingState, Intent, PatientProfile, Reply, Session};
pub use booking::{Booking, BookingStatus, DEFAULT_BOOKING_MINUTES};
pub use config::{ClinicInfo, ScheduleConfig, Settings};
pub use engine::available_start_times;
pub use error::{BookingError, ConfigError, SlotError, StoreError};
pub use interval::TimeInterval;
pub use procedure::Procedure;
pub use service::{BookingRequest, BookingService};
pub use store::{Appointment, AppointmentId, AppointmentStore, BookingSource, InMemoryStore, NewAppointment};
pub use time::{format_time, normalize_time, parse_date, parse_time};
