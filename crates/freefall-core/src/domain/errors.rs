//! Errors - 実行時エラーの分類
//!
//! `WorkError` is what a `Work` implementation returns from `force_download`.
//! The variant decides how the runner rewrites the status record:
//!
//! | kind                 | finished  | failed | waiting_until |
//! |----------------------|-----------|--------|---------------|
//! | `PartiallyCompleted` | false     | false  | set           |
//! | `TemporaryResource`  | unchanged | true   | set           |
//! | `Resource`           | true      | true   | unchanged     |
//! | `Unexpected`         | unchanged | true   | unchanged     |

use std::error::Error as StdError;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::Deadline;

/// ErrorKind は WorkError の分類（設定ファイルで suppress 対象を指定するため）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// 途中まで進んだ（エラーではない）
    PartiallyCompleted,
    /// 一時的なリソースエラー（後でリトライ）
    TemporaryResource,
    /// リソースエラー（今はこれ以上やっても無駄）
    Resource,
    /// 想定外のエラー（常に伝播）
    Unexpected,
}

impl ErrorKind {
    /// The resource-error family. A temporary resource error is a resource error.
    pub fn is_resource(self) -> bool {
        matches!(self, ErrorKind::Resource | ErrorKind::TemporaryResource)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::PartiallyCompleted => "PartiallyCompleted",
            ErrorKind::TemporaryResource => "TemporaryResourceError",
            ErrorKind::Resource => "ResourceError",
            ErrorKind::Unexpected => "UnexpectedError",
        };
        f.write_str(s)
    }
}

/// Execution-time signal returned by the work executor.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    #[error("partially completed: {message} (continue after {waiting_until})")]
    PartiallyCompleted {
        message: String,
        waiting_until: Deadline,
    },

    #[error("{message} (try again after {waiting_until})")]
    TemporaryResource {
        message: String,
        waiting_until: Deadline,
    },

    #[error("{message}")]
    Resource {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },

    #[error("{0}")]
    Unexpected(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl WorkError {
    /// Progress was made; continue no earlier than `try_again_later` (default: now).
    pub fn partially_completed(
        message: impl Into<String>,
        try_again_later: Option<Deadline>,
    ) -> Self {
        Self::PartiallyCompleted {
            message: message.into(),
            waiting_until: try_again_later.unwrap_or_else(|| Deadline::new(Utc::now())),
        }
    }

    /// Failed for now; may succeed after `try_again_later` (default: now).
    pub fn temporary(message: impl Into<String>, try_again_later: Option<Deadline>) -> Self {
        Self::TemporaryResource {
            message: message.into(),
            waiting_until: try_again_later.unwrap_or_else(|| Deadline::new(Utc::now())),
        }
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource {
            message: message.into(),
            source: None,
        }
    }

    pub fn resource_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Resource {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn unexpected(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Unexpected(source.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkError::PartiallyCompleted { .. } => ErrorKind::PartiallyCompleted,
            WorkError::TemporaryResource { .. } => ErrorKind::TemporaryResource,
            WorkError::Resource { .. } => ErrorKind::Resource,
            WorkError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Deadline carried by the retry-shaped variants.
    pub fn waiting_until(&self) -> Option<Deadline> {
        match self {
            WorkError::PartiallyCompleted { waiting_until, .. }
            | WorkError::TemporaryResource { waiting_until, .. } => Some(*waiting_until),
            _ => None,
        }
    }

    /// The error and its `source()` chain, one cause per line.
    pub fn detail(&self) -> String {
        let mut out = format!("{}: {}", self.kind(), self);
        let mut cause = self.source();
        while let Some(e) = cause {
            out.push_str("\n  caused by: ");
            out.push_str(&e.to_string());
            cause = e.source();
        }
        out
    }
}

impl From<std::io::Error> for WorkError {
    fn from(e: std::io::Error) -> Self {
        Self::unexpected(e)
    }
}
