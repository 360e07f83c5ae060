//! `slots` CLI — list free appointment start times and run the booking assistant.
//!
//! ## Usage
//!
//! ```sh
//! # Free 30-minute starts on a day with no bookings
//! slots available --date 2026-03-16 --duration 30
//!
//! # Same, against existing bookings, as JSON
//! slots available --date 2026-03-16 --duration 45 --bookings bookings.json --json
//!
//! # Bookings from stdin
//! cat bookings.json | slots available --date 2026-03-16 --duration 30 --bookings -
//!
//! # Validate a clinic config and print the effective schedule
//! slots --config clinic.toml check-config
//!
//! # Talk to the booking assistant, one message per line
//! slots chat --patient-id p1 --name Asha --secret 4821 --today 2026-03-10
//! ```
//!
//! The config file is taken from `--config`, else `CLINIC_CONFIG`, else the
//! built-in clinic defaults. Logs go to stderr; `-v` raises the level and
//! `RUST_LOG` overrides it.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use slot_engine::{
    format_time, parse_date, Booking, BookingAssistant, BookingService, InMemoryStore, PatientProfile, Session,
    Settings,
};

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Clinic appointment slot availability"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Clinic config file (TOML); falls back to $CLINIC_CONFIG, then defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List start times where a new appointment fits
    Available {
        /// Day to search (YYYY-MM-DD)
        #[arg(long, value_parser = day_arg)]
        date: NaiveDate,
        /// Appointment length in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,
        /// JSON array of existing bookings ("-" reads stdin)
        #[arg(long)]
        bookings: Option<String>,
        /// Print a JSON object instead of one time per line
        #[arg(long)]
        json: bool,
    },
    /// Validate the clinic config and print the effective schedule
    CheckConfig,
    /// Run the booking assistant over stdin/stdout, one message per line
    Chat {
        #[arg(long)]
        patient_id: String,
        #[arg(long)]
        name: String,
        /// The patient's 4-digit secret key
        #[arg(long)]
        secret: String,
        /// JSON array of existing bookings to seed the store with
        #[arg(long)]
        bookings: Option<String>,
        /// Override today's date (YYYY-MM-DD)
        #[arg(long, value_parser = day_arg)]
        today: Option<NaiveDate>,
    },
}

/// One entry of a bookings file. Entries without a date belong to the
/// default day of the command.
#[derive(Debug, Deserialize)]
struct BookingRecord {
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(flatten)]
    booking: Booking,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load clinic config")?;

    match cli.command {
        Commands::Available {
            date,
            duration,
            bookings,
            json,
        } => {
            let store = load_store(bookings.as_deref(), date)?;
            let service = BookingService::new(settings.schedule, store)?;
            let slots = service
                .available_slots(date, duration)
                .with_context(|| format!("Failed to compute availability for {}", date))?;
            let times: Vec<String> = slots.into_iter().map(format_time).collect();

            if json {
                let out = serde_json::json!({
                    "date": date.format("%Y-%m-%d").to_string(),
                    "duration_minutes": duration,
                    "slots": times,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if times.is_empty() {
                eprintln!("No available start times on {} for {} minutes.", date, duration);
            } else {
                for t in times {
                    println!("{}", t);
                }
            }
        }
        Commands::CheckConfig => {
            let s = &settings.schedule;
            println!("Config OK");
            println!("Morning:   {} - {}", format_time(s.work_start), format_time(s.lunch_start));
            println!("Lunch:     {} - {}", format_time(s.lunch_start), format_time(s.lunch_end));
            println!("Afternoon: {} - {}", format_time(s.lunch_end), format_time(s.work_end));
            println!("Step:      {} min", s.step_minutes);
            println!("Working:   {} min", s.working_minutes());
            println!("Clinic:    {} ({})", settings.clinic.name, settings.clinic.doctor);
        }
        Commands::Chat {
            patient_id,
            name,
            secret,
            bookings,
            today,
        } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let store = load_store(bookings.as_deref(), today)?;
            let service = BookingService::new(settings.schedule, store)?;
            let assistant = BookingAssistant::new(service, settings.clinic);
            let mut session = Session::new(PatientProfile {
                id: patient_id,
                name,
                secret_key: secret,
            });
            run_chat(&assistant, &mut session, today)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn day_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", s))
}

/// Build an in-memory store from a bookings file, if one was given.
fn load_store(path: Option<&str>, default_day: NaiveDate) -> Result<InMemoryStore> {
    let store = InMemoryStore::new();
    let Some(path) = path else {
        return Ok(store);
    };

    let raw = read_input(path)?;
    let records: Vec<BookingRecord> =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse bookings from {}", path))?;

    let mut by_day: BTreeMap<NaiveDate, Vec<Booking>> = BTreeMap::new();
    for record in records {
        by_day
            .entry(record.date.unwrap_or(default_day))
            .or_default()
            .push(record.booking);
    }
    for (day, bookings) in &by_day {
        store.seed(*day, bookings);
    }
    tracing::debug!(days = by_day.len(), total = store.len(), "bookings loaded");
    Ok(store)
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
    }
}

fn run_chat(assistant: &BookingAssistant<InMemoryStore>, session: &mut Session, today: NaiveDate) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let reply = assistant.handle(session, &line, None, today);
        writeln!(stdout, "{}", reply)?;
        writeln!(stdout)?;
    }
    Ok(())
}
