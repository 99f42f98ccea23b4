//! # Clock
//!
//! The wall clock is the only hidden input of the billing math. Everything
//! that needs "now" takes a [`Clock`], so tests can pin time instead of
//! sleeping.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Parses a stored timestamp.
///
/// ## Accepted Forms
/// - RFC 3339 (`2026-03-01T19:00:00Z`, `2026-03-01T20:00:00+01:00`)
/// - SQLite `CURRENT_TIMESTAMP` style, read as UTC (`2026-03-01 19:00:00`)
/// - ISO without offset, read as UTC (`2026-03-01T19:00:00.250`)
/// - Unix epoch milliseconds (`1772391600000`)
///
/// Anything else yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2026-03-01T19:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T20:00:00+01:00"), Some(expected));
    }

    #[test]
    fn test_parse_sqlite_and_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2026-03-01 19:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T19:00:00"), Some(expected));
    }

    #[test]
    fn test_parse_epoch_millis() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap();
        let millis = expected.timestamp_millis().to_string();
        assert_eq!(parse_timestamp(&millis), Some(expected));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("soon"), None);
        assert_eq!(parse_timestamp("2026-13-45 99:00:00"), None);
    }

    #[test]
    fn test_fixed_clock() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!((&clock).now(), at);
    }
}
