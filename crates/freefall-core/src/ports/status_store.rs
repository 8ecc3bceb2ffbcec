//! StatusStore port - per-request status の正本（source of truth）
//!
//! Status is addressed by the request's archive prefix. A store hands out an
//! exclusive session for one prefix; load/save only happen through that session
//! and the lock is released when the session is dropped, on every exit path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::Status;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The session could not be acquired without waiting.
    #[error("status for {0} is locked by another session")]
    Busy(PathBuf),

    #[error("status for {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("status I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    OperationFailed(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// StatusStore はリクエストごとの排他セッションを発行する
///
/// # 設計原則
/// - read-modify-write は必ず 1 セッション内で行う
/// - セッションの解放は Drop（RAII）
/// - 取得できないとき、待つか `StoreError::Busy` を返すかは実装次第
#[async_trait]
pub trait StatusStore: Send + Sync {
    type Session: StatusSession;

    async fn exclusive_session(&self, prefix: &Path) -> Result<Self::Session, StoreError>;
}

/// StatusSession は 1 リクエストの status への排他ハンドル
#[async_trait]
pub trait StatusSession: Send {
    /// A record that was never saved loads as `Status::default()`.
    async fn load(&mut self) -> Result<Status, StoreError>;

    async fn save(&mut self, status: &Status) -> Result<(), StoreError>;
}
