//! Deadline: a timezone-aware "try again no earlier than" instant.
//!
//! `waiting_until` must always carry an offset. A `chrono::DateTime<Tz>` already
//! does, so construction from one is infallible; text is the only way a naive
//! timestamp can sneak in, and `Deadline::parse` rejects it.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Error raised when text cannot become a [`Deadline`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeadlineError {
    #[error("deadline '{0}' has no timezone")]
    MissingTimezone(String),

    #[error("deadline '{0}' is not a valid timestamp")]
    Invalid(String),
}

/// Naive layouts we recognise only to report a precise error.
const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Deadline(DateTime<FixedOffset>);

impl Deadline {
    pub fn new<Tz: TimeZone>(at: DateTime<Tz>) -> Self {
        Self(at.fixed_offset())
    }

    /// Parse RFC 3339 text. The offset is mandatory.
    pub fn parse(s: &str) -> Result<Self, DeadlineError> {
        let s = s.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(at));
        }
        if let Ok(at) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return Ok(Self(at));
        }
        if NAIVE_LAYOUTS
            .iter()
            .any(|layout| NaiveDateTime::parse_from_str(s, layout).is_ok())
        {
            return Err(DeadlineError::MissingTimezone(s.to_string()));
        }
        Err(DeadlineError::Invalid(s.to_string()))
    }

    pub fn at(&self) -> DateTime<FixedOffset> {
        self.0
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }

    /// Is this deadline strictly later than `now`?
    pub fn is_after(&self, now: DateTime<Utc>) -> bool {
        self.0 > now
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Deadline {
    fn from(at: DateTime<Tz>) -> Self {
        Self::new(at)
    }
}

impl TryFrom<String> for Deadline {
    type Error = DeadlineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Deadline> for String {
    fn from(d: Deadline) -> Self {
        d.0.to_rfc3339()
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn parse_accepts_offsets() {
        let d = Deadline::parse("2024-01-01T12:00:00+09:00").unwrap();
        assert_eq!(
            d.to_utc(),
            Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap()
        );

        let z = Deadline::parse("2024-01-01T03:00:00Z").unwrap();
        assert_eq!(d, Deadline::new(z.to_utc()));
    }

    #[test]
    fn parse_rejects_naive_timestamps() {
        assert_eq!(
            Deadline::parse("2024-01-01T12:00:00"),
            Err(DeadlineError::MissingTimezone("2024-01-01T12:00:00".into()))
        );
        assert!(matches!(
            Deadline::parse("2024-01-01 12:00:00.250"),
            Err(DeadlineError::MissingTimezone(_))
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            Deadline::parse("tomorrow-ish"),
            Err(DeadlineError::Invalid(_))
        ));
    }

    #[test]
    fn is_after_compares_across_offsets() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        let later = Deadline::new((now + Duration::minutes(1)).with_timezone(&tokyo));
        let same = Deadline::new(now.with_timezone(&tokyo));

        assert!(later.is_after(now));
        assert!(!same.is_after(now));
    }

    #[test]
    fn serde_goes_through_parse() {
        let d = Deadline::parse("2024-05-06T07:08:09+00:00").unwrap();
        let s = serde_json::to_string(&d).unwrap();
        assert_eq!(s, "\"2024-05-06T07:08:09+00:00\"");

        let naive: Result<Deadline, _> = serde_json::from_str("\"2024-05-06T07:08:09\"");
        let err = naive.unwrap_err().to_string();
        assert!(err.contains("no timezone"));
    }
}
