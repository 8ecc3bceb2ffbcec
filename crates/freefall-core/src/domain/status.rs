//! Persisted per-request status record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Deadline;

/// Status of one request as stored by a `StatusStore`.
///
/// A missing record is the same as `Status::default()`: nothing attempted yet.
///
/// Transitions (one exclusive session each):
/// - admission: `claim()` -> processing
/// - resolution: outcome applied, then `release()`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    /// An attempt is in flight (or crashed while in flight).
    pub processing: bool,

    /// No further attempts are needed. Terminal.
    pub finished: bool,

    /// The most recent attempt ended in error.
    pub failed: bool,

    /// Earliest time another attempt should be made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_until: Option<Deadline>,
}

impl Status {
    /// Mark the start of an attempt.
    pub fn claim(&mut self) {
        self.processing = true;
        self.finished = false;
        self.failed = false;
    }

    /// Mark the end of an attempt, whatever its result.
    pub fn release(&mut self) {
        self.processing = false;
    }

    /// `waiting_until` if it is still later than `not_before`.
    pub fn pending_deadline(&self, not_before: DateTime<Utc>) -> Option<Deadline> {
        self.waiting_until.filter(|d| d.is_after(not_before))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn missing_fields_default_to_fresh_status() {
        let s: Status = serde_json::from_str("{}").unwrap();
        assert_eq!(s, Status::default());
        assert!(!s.processing && !s.finished && !s.failed);
        assert!(s.waiting_until.is_none());
    }

    #[test]
    fn claim_resets_previous_result() {
        let mut s = Status {
            processing: false,
            finished: false,
            failed: true,
            waiting_until: None,
        };
        s.claim();
        assert!(s.processing);
        assert!(!s.failed);

        s.release();
        assert!(!s.processing);
    }

    #[test]
    fn pending_deadline_ignores_past_deadlines() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut s = Status {
            waiting_until: Some(Deadline::new(now - Duration::seconds(5))),
            ..Status::default()
        };
        assert_eq!(s.pending_deadline(now), None);

        s.waiting_until = Some(Deadline::new(now + Duration::hours(1)));
        assert_eq!(s.pending_deadline(now), s.waiting_until);
    }

    #[test]
    fn naive_waiting_until_fails_to_load() {
        let raw = r#"{"processing":false,"waiting_until":"2024-01-01T00:00:00"}"#;
        assert!(serde_json::from_str::<Status>(raw).is_err());
    }
}
