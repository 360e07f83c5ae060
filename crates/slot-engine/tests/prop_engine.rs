//! Property-based tests for slot availability using proptest.
//!
//! These check invariants that hold for *any* valid schedule and booking set,
//! not just the worked examples in `engine_tests.rs`.

use chrono::{Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;
use slot_engine::{available_start_times, Booking, BookingStatus, ScheduleConfig, TimeInterval};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn minutes(m: i64) -> NaiveTime {
    NaiveTime::from_hms_opt((m / 60) as u32, (m % 60) as u32, 0).unwrap()
}

fn arb_status() -> impl Strategy<Value = BookingStatus> {
    prop_oneof![
        Just(BookingStatus::Pending),
        Just(BookingStatus::Approved),
        Just(BookingStatus::Rejected),
        Just(BookingStatus::Cancelled),
        Just(BookingStatus::Completed),
        Just(BookingStatus::Emergency),
    ]
}

/// Any valid schedule: arbitrary minute bounds and step.
fn arb_config() -> impl Strategy<Value = ScheduleConfig> {
    (300i64..=600, 30i64..=300, 1i64..=120, 30i64..=360, 1i64..=90).prop_map(
        |(start, morning, lunch, afternoon, step)| ScheduleConfig {
            work_start: minutes(start),
            lunch_start: minutes(start + morning),
            lunch_end: minutes(start + morning + lunch),
            work_end: minutes(start + morning + lunch + afternoon),
            step_minutes: step,
        },
    )
}

/// Schedules whose lunch bounds fall on the step grid from opening time.
fn arb_aligned_config() -> impl Strategy<Value = ScheduleConfig> {
    (
        6i64..=10,
        1i64..=4,
        1i64..=2,
        1i64..=5,
        prop_oneof![Just(5i64), Just(10), Just(15), Just(20), Just(30), Just(60)],
    )
        .prop_map(|(open, morning, lunch, afternoon, step)| {
            let start = open * 60;
            let lunch_start = start + morning * 60;
            let lunch_end = lunch_start + lunch * 60;
            ScheduleConfig {
                work_start: minutes(start),
                lunch_start: minutes(lunch_start),
                lunch_end: minutes(lunch_end),
                work_end: minutes(lunch_end + afternoon * 60),
                step_minutes: step,
            }
        })
}

fn arb_bookings() -> impl Strategy<Value = Vec<Booking>> {
    prop::collection::vec(
        (300i64..=1200, 5i64..=120, arb_status()).prop_map(|(start, len, status)| {
            Booking::new(minutes(start), len, status)
        }),
        0..8,
    )
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn interval(start: NaiveTime, len: i64) -> TimeInterval {
    let s = day().and_time(start);
    TimeInterval::new(s, s + Duration::minutes(len))
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: every start fits inside working hours
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn starts_fit_inside_working_hours(
        cfg in arb_config(),
        duration in 1i64..=300,
        bookings in arb_bookings(),
    ) {
        let result = available_start_times(day(), duration, &cfg, &bookings).unwrap();
        let close = day().and_time(cfg.work_end);

        for t in result {
            prop_assert!(t >= cfg.work_start, "{} before opening", t);
            prop_assert!(interval(t, duration).end <= close, "{} + {} runs past close", t, duration);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: no start overlaps lunch
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn starts_avoid_lunch(
        cfg in arb_config(),
        duration in 1i64..=300,
        bookings in arb_bookings(),
    ) {
        let lunch = TimeInterval::new(day().and_time(cfg.lunch_start), day().and_time(cfg.lunch_end));
        let result = available_start_times(day(), duration, &cfg, &bookings).unwrap();

        for t in result {
            prop_assert!(!interval(t, duration).overlaps(&lunch), "{} + {} hits lunch", t, duration);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: no start overlaps an occupying booking
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn starts_avoid_occupying_bookings(
        cfg in arb_config(),
        duration in 1i64..=300,
        bookings in arb_bookings(),
    ) {
        let result = available_start_times(day(), duration, &cfg, &bookings).unwrap();

        for t in &result {
            let candidate = interval(*t, duration);
            for b in bookings.iter().filter(|b| b.status.occupies_slot()) {
                let busy = interval(b.start_time, b.duration_minutes);
                prop_assert!(!candidate.overlaps(&busy), "{} overlaps booking {:?}", t, b);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: output is strictly increasing and repeatable
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn output_is_strictly_increasing_and_repeatable(
        cfg in arb_config(),
        duration in 1i64..=300,
        bookings in arb_bookings(),
    ) {
        let first = available_start_times(day(), duration, &cfg, &bookings).unwrap();
        let second = available_start_times(day(), duration, &cfg, &bookings).unwrap();

        prop_assert_eq!(&first, &second);
        for pair in first.windows(2) {
            prop_assert!(pair[0] < pair[1], "not increasing: {} then {}", pair[0], pair[1]);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: inert bookings never change the result
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn inert_bookings_are_ignored(
        cfg in arb_config(),
        duration in 1i64..=300,
        bookings in arb_bookings(),
    ) {
        let occupying: Vec<Booking> = bookings
            .iter()
            .filter(|b| b.status.occupies_slot())
            .cloned()
            .collect();

        prop_assert_eq!(
            available_start_times(day(), duration, &cfg, &bookings).unwrap(),
            available_start_times(day(), duration, &cfg, &occupying).unwrap()
        );
    }
}

// ---------------------------------------------------------------------------
// Property 6: a longer appointment never gains a start (grid-aligned lunch)
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn longer_duration_never_adds_starts(
        cfg in arb_aligned_config(),
        shorter in 1i64..=240,
        extra in 1i64..=120,
        bookings in arb_bookings(),
    ) {
        let short = available_start_times(day(), shorter, &cfg, &bookings).unwrap();
        let long = available_start_times(day(), shorter + extra, &cfg, &bookings).unwrap();

        for t in long {
            prop_assert!(short.contains(&t), "{} valid for {} min but not for {}", t, shorter + extra, shorter);
        }
    }
}
