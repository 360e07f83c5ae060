//! Half-open time intervals on a single day.
//!
//! Adjacent intervals (where one ends exactly when another starts) do NOT
//! overlap, so back-to-back appointments never conflict.

use chrono::{NaiveDateTime, NaiveTime};

/// A half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeInterval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Two intervals conflict iff `!(a.end <= b.start || a.start >= b.end)`.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start.time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn iv(sh: u32, sm: u32, eh: u32, em: u32) -> TimeInterval {
        let day = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
        TimeInterval::new(
            day.and_hms_opt(sh, sm, 0).unwrap(),
            day.and_hms_opt(eh, em, 0).unwrap(),
        )
    }

    #[test]
    fn partial_overlap_conflicts() {
        assert!(iv(9, 0, 10, 0).overlaps(&iv(9, 30, 10, 30)));
        assert!(iv(9, 30, 10, 30).overlaps(&iv(9, 0, 10, 0)));
    }

    #[test]
    fn containment_conflicts() {
        assert!(iv(9, 0, 12, 0).overlaps(&iv(10, 0, 10, 15)));
        assert!(iv(10, 0, 10, 15).overlaps(&iv(9, 0, 12, 0)));
    }

    #[test]
    fn touching_boundaries_do_not_conflict() {
        assert!(!iv(9, 0, 10, 0).overlaps(&iv(10, 0, 11, 0)));
        assert!(!iv(10, 0, 11, 0).overlaps(&iv(9, 0, 10, 0)));
    }
}
