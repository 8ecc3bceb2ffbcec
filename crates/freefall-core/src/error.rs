//! Errors raised by the runner and the batch driver.
//!
//! Work-level failures live in `domain::errors`; these wrap infrastructure
//! failures (status store, request log) and errors the batch propagates.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::WorkError;
use crate::ports::StoreError;

/// Which status session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Admission,
    Resolution,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Admission => f.write_str("admission"),
            Phase::Resolution => f.write_str("resolution"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("status store failed during {phase} of {request}: {source}")]
    Store {
        request: String,
        phase: Phase,
        #[source]
        source: StoreError,
    },

    #[error("cannot open request log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum BatchError {
    /// A failed attempt whose kind is not suppressed.
    #[error("{request}: {error}")]
    Work {
        request: String,
        #[source]
        error: WorkError,
    },

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

impl BatchError {
    pub fn work_error(&self) -> Option<&WorkError> {
        match self {
            BatchError::Work { error, .. } => Some(error),
            BatchError::Runner(_) => None,
        }
    }
}
