//! Wire formats for times of day and calendar days.
//!
//! Times cross process boundaries as `HH:MM` 24-hour strings and days as
//! `YYYY-MM-DD`. Store exports sometimes carry seconds (`HH:MM:SS`), which
//! parsing also accepts.

use chrono::{NaiveDate, NaiveTime};

/// Parse a 24-hour `HH:MM` (or `HH:MM:SS`) time of day.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Format a time of day as `HH:MM`.
pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Parse a strict `YYYY-MM-DD` calendar day.
///
/// chrono accepts single-digit months and days; the wire format does not.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let shape_ok = s.len() == 10
        && s.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Normalize free-form time input (`14:30`, `2:30 pm`, `2 PM`) to a time of day.
///
/// Returns `None` for anything else, including seconds-bearing input.
pub fn normalize_time(text: &str) -> Option<NaiveTime> {
    let upper = text.trim().to_uppercase();

    if let Ok(t) = NaiveTime::parse_from_str(&upper, "%H:%M") {
        return Some(t);
    }
    if let Ok(t) = NaiveTime::parse_from_str(&upper, "%I:%M %p") {
        return Some(t);
    }

    // "2 PM": chrono needs a minute field to build a time.
    let mut parts = upper.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(hour), Some(meridiem), None) if hour.chars().all(|c| c.is_ascii_digit()) => {
            NaiveTime::parse_from_str(&format!("{}:00 {}", hour, meridiem), "%I:%M %p").ok()
        }
        _ => None,
    }
}

/// Serde adapter storing a [`NaiveTime`] as `HH:MM`.
///
/// ```rust
/// use chrono::NaiveTime;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Row {
///     #[serde(with = "slot_engine::time::hhmm")]
///     at: NaiveTime,
/// }
///
/// let row: Row = serde_json::from_str(r#"{"at":"09:30"}"#).unwrap();
/// assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"at":"09:30"}"#);
/// ```
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
    }
}

/// Serde adapter storing a [`NaiveDate`] as strict `YYYY-MM-DD`.
pub mod ymd {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&d.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parse_time_accepts_minutes_and_seconds() {
        assert_eq!(parse_time("09:15"), Some(hm(9, 15)));
        assert_eq!(parse_time("14:00:00"), Some(hm(14, 0)));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("noon"), None);
    }

    #[test]
    fn parse_date_is_strict() {
        assert_eq!(
            parse_date("2026-03-16"),
            NaiveDate::from_ymd_opt(2026, 3, 16)
        );
        assert_eq!(parse_date("2026-3-16"), None);
        assert_eq!(parse_date("2026-02-30"), None);
        assert_eq!(parse_date("16/03/2026"), None);
    }

    #[test]
    fn normalize_time_handles_clock_styles() {
        assert_eq!(normalize_time("14:30"), Some(hm(14, 30)));
        assert_eq!(normalize_time("2:30 pm"), Some(hm(14, 30)));
        assert_eq!(normalize_time("9 AM"), Some(hm(9, 0)));
        assert_eq!(normalize_time("12 pm"), Some(hm(12, 0)));
        assert_eq!(normalize_time("tomorrow"), None);
        assert_eq!(normalize_time("2 pm please"), None);
    }
}
