//! Compute the start times at which a new appointment fits on a clinic day.
//!
//! Candidates walk forward from the opening time in fixed steps. A candidate
//! that touches the lunch break is dropped and the walk jumps straight to the
//! end of lunch, so afternoon candidates are aligned to `lunch_end` rather
//! than to the morning grid. Surviving candidates are then checked against
//! every occupying booking with half-open overlap.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::booking::Booking;
use crate::config::ScheduleConfig;
use crate::error::{Result, SlotError};
use crate::interval::TimeInterval;

/// List every start time on `day` where an appointment of `duration_minutes` fits.
///
/// `existing` may hold bookings of any status; only pending and approved ones
/// occupy time. Returns start times in strictly increasing order. An empty
/// list means the day has no room and is not an error.
///
/// # Errors
/// Returns `SlotError::InvalidInput` if `duration_minutes` is not positive.
/// Returns `SlotError::InvalidConfig` if the schedule bounds are out of order
/// or the step is not positive.
pub fn available_start_times(
    day: NaiveDate,
    duration_minutes: i64,
    config: &ScheduleConfig,
    existing: &[Booking],
) -> Result<Vec<NaiveTime>> {
    if duration_minutes <= 0 {
        return Err(SlotError::InvalidInput(format!(
            "duration must be positive, got {} minutes",
            duration_minutes
        )));
    }
    config.validate()?;

    let day_start = day.and_time(config.work_start);
    let day_end = day.and_time(config.work_end);
    let lunch_start = day.and_time(config.lunch_start);
    let lunch_end = day.and_time(config.lunch_end);

    // Nothing longer than the opening hours can fit; also keeps the
    // arithmetic below within a single day.
    if duration_minutes > (day_end - day_start).num_minutes() {
        tracing::trace!(%day, duration_minutes, "duration exceeds opening hours");
        return Ok(Vec::new());
    }

    let occupied: Vec<TimeInterval> = existing
        .iter()
        .filter_map(|b| b.occupied_interval(day))
        .collect();

    let duration = Duration::minutes(duration_minutes);
    let step = Duration::minutes(config.step_minutes);

    let mut available = Vec::new();
    let mut current = day_start;

    loop {
        let candidate = TimeInterval::new(current, current + duration);

        if candidate.end > day_end {
            break;
        }

        if candidate.start < lunch_end && candidate.end > lunch_start {
            current = lunch_end;
            continue;
        }

        if !occupied.iter().any(|busy| candidate.overlaps(busy)) {
            available.push(candidate.start_time());
        }

        current += step;
    }

    tracing::trace!(
        %day,
        duration_minutes,
        occupied = occupied.len(),
        available = available.len(),
        "computed available start times"
    );

    Ok(available)
}
