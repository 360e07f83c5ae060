//! Step-wise booking conversation.
//!
//! A session walks idle → await_reason → await_date → await_time →
//! await_secret and ends committed or aborted, returning to idle either way.
//! The engine is consulted when a date is given and again when a time is
//! picked; the store's atomic insert decides the commit. Free-form chat
//! outside a booking is routed by [`Intent`], which an external NLU service
//! may supply or [`Intent::detect`] may guess from keywords.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::booking::BookingStatus;
use crate::config::ClinicInfo;
use crate::error::BookingError;
use crate::procedure::Procedure;
use crate::service::{BookingRequest, BookingService};
use crate::store::{AppointmentId, AppointmentStore, BookingSource};
use crate::time::{format_time, normalize_time, parse_date};

/// Secret-key entries allowed before a booking is abandoned.
pub const MAX_SECRET_ATTEMPTS: u8 = 3;

const ABORT_WORDS: &[&str] = &["cancel", "stop", "abort", "quit"];

const BOOKING_KEYWORDS: &[&str] = &[
    "book",
    "appointment",
    "schedule",
    "visit dentist",
    "checkup",
    "cleaning",
    "tooth pain",
];

const GREETING_WORDS: &[&str] = &["hi", "hello", "hey", "hiya"];

const CLINIC_KEYWORDS: &[&str] = &["services", "timing", "hours", "open", "doctor", "clinic"];

/// What the patient wants when no booking is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Help,
    General,
    ClinicInfo,
    Status,
    Book,
}

impl Intent {
    /// Keyword fallback for when no classifier verdict is available.
    pub fn detect(message: &str) -> Intent {
        let lowered = message.trim().to_lowercase();

        if lowered.contains("status") {
            return Intent::Status;
        }
        if BOOKING_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            return Intent::Book;
        }
        if lowered.contains("help") {
            return Intent::Help;
        }
        let first_word = lowered
            .split(|c: char| !c.is_alphanumeric())
            .find(|w| !w.is_empty())
            .unwrap_or("");
        if GREETING_WORDS.contains(&first_word) {
            return Intent::Greeting;
        }
        if CLINIC_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            return Intent::ClinicInfo;
        }
        Intent::General
    }
}

impl FromStr for Intent {
    type Err = String;

    /// Accepts classifier handoff labels, including `booking` and `availability`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greeting" => Ok(Intent::Greeting),
            "help" => Ok(Intent::Help),
            "general" | "none" => Ok(Intent::General),
            "clinic_info" => Ok(Intent::ClinicInfo),
            "status" => Ok(Intent::Status),
            "book" | "booking" | "availability" => Ok(Intent::Book),
            other => Err(format!("unknown intent '{}'", other)),
        }
    }
}

/// The patient a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: String,
    pub name: String,
    /// Four-digit key confirming a booking.
    pub secret_key: String,
}

/// Per-session position in the booking conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BookingState {
    #[default]
    Idle,
    AwaitReason,
    AwaitDate {
        procedure: Procedure,
        reason: String,
    },
    AwaitTime {
        procedure: Procedure,
        reason: String,
        date: NaiveDate,
    },
    AwaitSecret {
        procedure: Procedure,
        reason: String,
        date: NaiveDate,
        time: NaiveTime,
        attempts: u8,
    },
}

impl BookingState {
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BookingState::Idle => "idle",
            BookingState::AwaitReason => "await_reason",
            BookingState::AwaitDate { .. } => "await_date",
            BookingState::AwaitTime { .. } => "await_time",
            BookingState::AwaitSecret { .. } => "await_secret",
        }
    }
}

/// Conversation state for one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub patient: PatientProfile,
    #[serde(default)]
    pub state: BookingState,
}

impl Session {
    pub fn new(patient: PatientProfile) -> Self {
        Self {
            patient,
            state: BookingState::Idle,
        }
    }
}

/// What the assistant says back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    EmptyMessage,
    Greeting { name: String },
    Help,
    General,
    ClinicInfo(ClinicInfo),
    StatusNone,
    StatusFound {
        date: NaiveDate,
        time: NaiveTime,
        procedure: Option<String>,
        status: BookingStatus,
    },
    StatusUnavailable,
    AskReason,
    InvalidReason,
    AskDate { procedure: Procedure },
    InvalidDate,
    PastDate { date: NaiveDate },
    NoSlots { date: NaiveDate },
    AskTime { date: NaiveDate, slots: Vec<NaiveTime> },
    InvalidTime,
    SlotUnavailable { time: NaiveTime, slots: Vec<NaiveTime> },
    AskSecret { date: NaiveDate, time: NaiveTime },
    WrongSecret { remaining: u8 },
    TooManyAttempts,
    SlotConflict { slots: Vec<NaiveTime> },
    AvailabilityUnknown,
    BookingSuccess {
        id: AppointmentId,
        date: NaiveDate,
        time: NaiveTime,
        procedure: Procedure,
    },
    Aborted,
}

fn bullet_list(slots: &[NaiveTime]) -> String {
    slots
        .iter()
        .map(|t| format!("• {}", format_time(*t)))
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::EmptyMessage => write!(f, "Please type something."),
            Reply::Greeting { name } => write!(f, "Hello {}! How can I help you today?", name),
            Reply::Help => write!(
                f,
                "I can book an appointment for you or check on your latest one. \
                 Ask about the clinic for services and timings."
            ),
            Reply::General => write!(f, "I'm here to help with appointments. Say \"book\" to get started."),
            Reply::ClinicInfo(info) => {
                writeln!(f, "{}", info.name)?;
                writeln!(f, "Doctor: {}", info.doctor)?;
                writeln!(f, "Timings: {}", info.timings)?;
                write!(f, "Services:")?;
                for service in &info.services {
                    write!(f, "\n• {}", service)?;
                }
                Ok(())
            }
            Reply::StatusNone => write!(f, "You don't have any appointments yet."),
            Reply::StatusFound {
                date,
                time,
                procedure,
                status,
            } => {
                let status = status.as_str();
                let mut chars = status.chars();
                let capitalized: String = chars
                    .next()
                    .map(|c| c.to_uppercase().chain(chars).collect())
                    .unwrap_or_default();
                write!(
                    f,
                    "Your latest appointment: {} at {} ({}) - {}",
                    date,
                    format_time(*time),
                    procedure.as_deref().unwrap_or("visit"),
                    capitalized
                )
            }
            Reply::StatusUnavailable => write!(f, "I can't look up your appointments right now. Please try again shortly."),
            Reply::AskReason => write!(f, "What brings you in? Tell me the reason for your visit."),
            Reply::InvalidReason => write!(
                f,
                "I couldn't match that to a treatment. Try describing it, e.g. \"cleaning\" or \"tooth pain\"."
            ),
            Reply::AskDate { procedure } => write!(
                f,
                "{} takes about {} minutes. Which date works for you? (YYYY-MM-DD)",
                procedure,
                procedure.duration_minutes()
            ),
            Reply::InvalidDate => write!(f, "Please give the date as YYYY-MM-DD."),
            Reply::PastDate { date } => write!(f, "{} is in the past. Please pick a later date.", date),
            Reply::NoSlots { date } => write!(
                f,
                "Sorry, there are no free slots on {}. Start again with another date whenever you like.",
                date
            ),
            Reply::AskTime { date, slots } => write!(
                f,
                "Available start times on {}:\n{}\nWhich time would you like?",
                date,
                bullet_list(slots)
            ),
            Reply::InvalidTime => write!(f, "Please give a time like 14:30 or 2:30 PM."),
            Reply::SlotUnavailable { time, slots } => write!(
                f,
                "{} isn't available. Please choose one of:\n{}",
                format_time(*time),
                bullet_list(slots)
            ),
            Reply::AskSecret { date, time } => write!(
                f,
                "To confirm {} at {}, please enter your 4-digit secret key.",
                date,
                format_time(*time)
            ),
            Reply::WrongSecret { remaining } => write!(
                f,
                "That secret key is not correct. {} attempt(s) left.",
                remaining
            ),
            Reply::TooManyAttempts => write!(f, "Too many wrong attempts. The booking has been cancelled."),
            Reply::SlotConflict { slots } => write!(
                f,
                "Someone just took that slot. Still available:\n{}",
                bullet_list(slots)
            ),
            Reply::AvailabilityUnknown => write!(
                f,
                "I can't check the schedule right now. Please try again in a moment."
            ),
            Reply::BookingSuccess {
                id,
                date,
                time,
                procedure,
            } => write!(
                f,
                "Booked! {} on {} at {} (reference #{}). The doctor will confirm shortly.",
                procedure,
                date,
                format_time(*time),
                id
            ),
            Reply::Aborted => write!(f, "Okay, I've cancelled this booking."),
        }
    }
}

/// Four ASCII digits.
pub fn is_valid_secret_key(key: &str) -> bool {
    key.len() == 4 && key.chars().all(|c| c.is_ascii_digit())
}

/// Drives sessions through the booking conversation.
#[derive(Debug)]
pub struct BookingAssistant<S> {
    service: BookingService<S>,
    clinic: ClinicInfo,
}

impl<S: AppointmentStore> BookingAssistant<S> {
    pub fn new(service: BookingService<S>, clinic: ClinicInfo) -> Self {
        Self { service, clinic }
    }

    pub fn service(&self) -> &BookingService<S> {
        &self.service
    }

    /// Handle one message. `intent` is the classifier's verdict, if any; it is
    /// ignored while a booking is in progress.
    pub fn handle(
        &self,
        session: &mut Session,
        message: &str,
        intent: Option<Intent>,
        today: NaiveDate,
    ) -> Reply {
        let message = message.trim();
        if message.is_empty() {
            return Reply::EmptyMessage;
        }

        if session.state.is_active() {
            if ABORT_WORDS.contains(&message.to_lowercase().as_str()) {
                tracing::info!(patient = %session.patient.id, from = session.state.name(), "booking aborted");
                session.state = BookingState::Idle;
                return Reply::Aborted;
            }
            return self.advance(session, message, today);
        }

        match intent.unwrap_or_else(|| Intent::detect(message)) {
            Intent::Greeting => Reply::Greeting {
                name: session.patient.name.clone(),
            },
            Intent::Help => Reply::Help,
            Intent::General => Reply::General,
            Intent::ClinicInfo => Reply::ClinicInfo(self.clinic.clone()),
            Intent::Status => self.status(&session.patient),
            Intent::Book => {
                session.state = BookingState::AwaitReason;
                Reply::AskReason
            }
        }
    }

    fn status(&self, patient: &PatientProfile) -> Reply {
        match self.service.store().latest_for_patient(&patient.id) {
            Ok(Some(a)) => Reply::StatusFound {
                date: a.date,
                time: a.start_time,
                procedure: a.procedure,
                status: a.status,
            },
            Ok(None) => Reply::StatusNone,
            Err(e) => {
                tracing::warn!(patient = %patient.id, error = %e, "status lookup failed");
                Reply::StatusUnavailable
            }
        }
    }

    fn advance(&self, session: &mut Session, message: &str, today: NaiveDate) -> Reply {
        let state = std::mem::take(&mut session.state);
        let from = state.name();

        let (next, reply) = match state {
            BookingState::Idle => (BookingState::Idle, Reply::General),
            BookingState::AwaitReason => match Procedure::from_reason(message) {
                Some(procedure) => (
                    BookingState::AwaitDate {
                        procedure,
                        reason: message.to_string(),
                    },
                    Reply::AskDate { procedure },
                ),
                None => (BookingState::AwaitReason, Reply::InvalidReason),
            },
            BookingState::AwaitDate { procedure, reason } => {
                self.on_date(procedure, reason, message, today)
            }
            BookingState::AwaitTime {
                procedure,
                reason,
                date,
            } => self.on_time(procedure, reason, date, message),
            BookingState::AwaitSecret {
                procedure,
                reason,
                date,
                time,
                attempts,
            } => self.on_secret(
                &session.patient,
                Pending {
                    procedure,
                    reason,
                    date,
                    time,
                },
                attempts,
                message,
                today,
            ),
        };

        if next.name() != from {
            tracing::info!(patient = %session.patient.id, from, to = next.name(), "booking state changed");
        }
        session.state = next;
        reply
    }

    fn on_date(
        &self,
        procedure: Procedure,
        reason: String,
        message: &str,
        today: NaiveDate,
    ) -> (BookingState, Reply) {
        let Some(date) = parse_date(message) else {
            return (BookingState::AwaitDate { procedure, reason }, Reply::InvalidDate);
        };
        if date < today {
            return (
                BookingState::AwaitDate { procedure, reason },
                Reply::PastDate { date },
            );
        }

        match self.service.available_slots(date, procedure.duration_minutes()) {
            Ok(slots) if slots.is_empty() => (BookingState::Idle, Reply::NoSlots { date }),
            Ok(slots) => (
                BookingState::AwaitTime {
                    procedure,
                    reason,
                    date,
                },
                Reply::AskTime { date, slots },
            ),
            Err(BookingError::AvailabilityUnknown(_)) => (
                BookingState::AwaitDate { procedure, reason },
                Reply::AvailabilityUnknown,
            ),
            Err(e) => abort(e),
        }
    }

    fn on_time(
        &self,
        procedure: Procedure,
        reason: String,
        date: NaiveDate,
        message: &str,
    ) -> (BookingState, Reply) {
        let await_time = |reason| BookingState::AwaitTime {
            procedure,
            reason,
            date,
        };

        let Some(time) = normalize_time(message) else {
            return (await_time(reason), Reply::InvalidTime);
        };

        // Availability may have changed since the list was shown.
        match self.service.available_slots(date, procedure.duration_minutes()) {
            Ok(slots) if slots.is_empty() => (BookingState::Idle, Reply::NoSlots { date }),
            Ok(slots) if !slots.contains(&time) => {
                (await_time(reason), Reply::SlotUnavailable { time, slots })
            }
            Ok(_) => (
                BookingState::AwaitSecret {
                    procedure,
                    reason,
                    date,
                    time,
                    attempts: 0,
                },
                Reply::AskSecret { date, time },
            ),
            Err(BookingError::AvailabilityUnknown(_)) => {
                (await_time(reason), Reply::AvailabilityUnknown)
            }
            Err(e) => abort(e),
        }
    }

    fn on_secret(
        &self,
        patient: &PatientProfile,
        pending: Pending,
        attempts: u8,
        message: &str,
        today: NaiveDate,
    ) -> (BookingState, Reply) {
        let attempts = attempts.saturating_add(1);
        if attempts > MAX_SECRET_ATTEMPTS {
            tracing::warn!(patient = %patient.id, "secret key attempts exhausted");
            return (BookingState::Idle, Reply::TooManyAttempts);
        }
        if !is_valid_secret_key(message) || message != patient.secret_key {
            return (
                pending.awaiting_secret(attempts),
                Reply::WrongSecret {
                    remaining: MAX_SECRET_ATTEMPTS - attempts,
                },
            );
        }

        let request = BookingRequest {
            patient_id: patient.id.clone(),
            date: pending.date,
            start_time: pending.time,
            duration_minutes: pending.procedure.duration_minutes(),
            procedure: Some(pending.procedure.label().to_string()),
            reason: Some(pending.reason.clone()),
            source: BookingSource::Chatbot,
        };

        match self.service.book(request, today) {
            Ok(appointment) => (
                BookingState::Idle,
                Reply::BookingSuccess {
                    id: appointment.id,
                    date: appointment.date,
                    time: appointment.start_time,
                    procedure: pending.procedure,
                },
            ),
            Err(e) if e.is_conflict() => self.after_conflict(pending),
            Err(BookingError::AvailabilityUnknown(_)) => {
                (pending.awaiting_secret(attempts - 1), Reply::AvailabilityUnknown)
            }
            Err(BookingError::PastDate(date)) => (BookingState::Idle, Reply::PastDate { date }),
            Err(e) => abort(e),
        }
    }

    /// Offer what is still free after losing a slot at commit time.
    fn after_conflict(&self, pending: Pending) -> (BookingState, Reply) {
        let Pending {
            procedure,
            reason,
            date,
            ..
        } = pending;
        let await_time = BookingState::AwaitTime {
            procedure,
            reason,
            date,
        };
        match self.service.available_slots(date, procedure.duration_minutes()) {
            Ok(slots) if slots.is_empty() => (BookingState::Idle, Reply::NoSlots { date }),
            Ok(slots) => (await_time, Reply::SlotConflict { slots }),
            Err(BookingError::AvailabilityUnknown(_)) => (await_time, Reply::AvailabilityUnknown),
            Err(e) => abort(e),
        }
    }
}

/// A chosen slot awaiting confirmation.
struct Pending {
    procedure: Procedure,
    reason: String,
    date: NaiveDate,
    time: NaiveTime,
}

impl Pending {
    fn awaiting_secret(self, attempts: u8) -> BookingState {
        BookingState::AwaitSecret {
            procedure: self.procedure,
            reason: self.reason,
            date: self.date,
            time: self.time,
            attempts,
        }
    }
}

/// Give up on the booking after an error the patient cannot fix by retrying.
fn abort(e: BookingError) -> (BookingState, Reply) {
    tracing::warn!(error = %e, "booking abandoned");
    (BookingState::Idle, Reply::Aborted)
}
