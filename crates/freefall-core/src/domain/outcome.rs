//! Outcome model: what one `process` call did to a request.
//!
//! Expected skips (already processing / finished / waiting) are ordinary values
//! here, not errors. Only `Failed` carries an error, and the batch driver decides
//! whether it travels further.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Deadline, ErrorKind, WorkError};

/// Why admission refused to start an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another attempt is in flight, or one crashed while marked in-progress.
    AlreadyProcessing,

    /// Nothing left to do.
    AlreadyFinished,

    /// `waiting_until` has not passed yet.
    TemporaryUnavailable(Deadline),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyProcessing => f.write_str("already in progress"),
            SkipReason::AlreadyFinished => f.write_str("already finished"),
            SkipReason::TemporaryUnavailable(at) => {
                write!(f, "temporarily unavailable, retry after {at}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryCause {
    /// Progress was made; the rest comes later.
    PartiallyCompleted,

    /// Nothing was achieved; the resource should recover.
    TemporaryResource,
}

/// An attempt that ended with a rescheduling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retry {
    pub waiting_until: Deadline,
    pub cause: RetryCause,
    pub message: String,
}

#[derive(Debug)]
pub enum Outcome {
    Success,
    Skipped(SkipReason),
    Retryable(Retry),
    Failed(WorkError),
}

/// Flat classification used in summaries and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    AlreadyProcessing,
    AlreadyFinished,
    TemporaryUnavailable,
    PartiallyCompleted,
    TemporaryResource,
    Failed,
}

impl Outcome {
    /// Classify the result of the work executor.
    ///
    /// Retry-shaped errors become `Retryable`; everything else is `Failed`.
    pub fn from_work(result: Result<(), WorkError>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(WorkError::PartiallyCompleted {
                message,
                waiting_until,
            }) => Outcome::Retryable(Retry {
                waiting_until,
                cause: RetryCause::PartiallyCompleted,
                message,
            }),
            Err(WorkError::TemporaryResource {
                message,
                waiting_until,
            }) => Outcome::Retryable(Retry {
                waiting_until,
                cause: RetryCause::TemporaryResource,
                message,
            }),
            Err(e) => Outcome::Failed(e),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success => OutcomeKind::Success,
            Outcome::Skipped(SkipReason::AlreadyProcessing) => OutcomeKind::AlreadyProcessing,
            Outcome::Skipped(SkipReason::AlreadyFinished) => OutcomeKind::AlreadyFinished,
            Outcome::Skipped(SkipReason::TemporaryUnavailable(_)) => {
                OutcomeKind::TemporaryUnavailable
            }
            Outcome::Retryable(r) => match r.cause {
                RetryCause::PartiallyCompleted => OutcomeKind::PartiallyCompleted,
                RetryCause::TemporaryResource => OutcomeKind::TemporaryResource,
            },
            Outcome::Failed(_) => OutcomeKind::Failed,
        }
    }

    /// Error kind when the attempt failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Failed(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at() -> Deadline {
        Deadline::new(Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn from_work_maps_retry_signals() {
        let o = Outcome::from_work(Err(WorkError::partially_completed("half", Some(at()))));
        assert_eq!(o.kind(), OutcomeKind::PartiallyCompleted);
        let Outcome::Retryable(r) = o else {
            panic!("expected Retryable");
        };
        assert_eq!(r.waiting_until, at());
        assert_eq!(r.message, "half");

        let o = Outcome::from_work(Err(WorkError::temporary("503", Some(at()))));
        assert_eq!(o.kind(), OutcomeKind::TemporaryResource);
    }

    #[test]
    fn from_work_maps_failures() {
        assert_eq!(Outcome::from_work(Ok(())).kind(), OutcomeKind::Success);

        let o = Outcome::from_work(Err(WorkError::resource("gone")));
        assert_eq!(o.kind(), OutcomeKind::Failed);
        assert_eq!(o.error_kind(), Some(ErrorKind::Resource));

        let o = Outcome::from_work(Err(WorkError::unexpected("boom")));
        assert_eq!(o.error_kind(), Some(ErrorKind::Unexpected));
    }

    #[test]
    fn skip_reasons_read_well() {
        assert_eq!(SkipReason::AlreadyFinished.to_string(), "already finished");
        assert!(
            SkipReason::TemporaryUnavailable(at())
                .to_string()
                .starts_with("temporarily unavailable, retry after 2030-06-01")
        );
    }

    #[test]
    fn outcome_kind_serializes_screaming_snake() {
        let s = serde_json::to_string(&OutcomeKind::AlreadyFinished).unwrap();
        assert_eq!(s, "\"ALREADY_FINISHED\"");
    }
}
