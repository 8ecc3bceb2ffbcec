//! InMemoryStatusStore - 開発・テスト用の status store
//!
//! # 実装詳細
//! - prefix ごとに `tokio::sync::Mutex` を 1 つ持つ
//! - セッション = `OwnedMutexGuard`（Drop で解放）
//! - `AcquireMode::NonBlocking` なら待たずに `StoreError::Busy`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::Status;
use crate::ports::{StatusSession, StatusStore, StoreError};

/// How a store behaves when the record is already locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquireMode {
    /// Wait for the current session to end.
    #[default]
    Wait,
    /// Report `StoreError::Busy` immediately.
    NonBlocking,
}

type Slot = Arc<AsyncMutex<Option<Status>>>;

#[derive(Debug, Default, Clone)]
pub struct InMemoryStatusStore {
    slots: Arc<Mutex<HashMap<PathBuf, Slot>>>,
    mode: AcquireMode,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: AcquireMode) -> Self {
        Self {
            slots: Arc::default(),
            mode,
        }
    }

    fn slot(&self, prefix: &Path) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(prefix.to_path_buf()).or_default().clone()
    }

    /// Current record, waiting for any open session to finish.
    pub async fn snapshot(&self, prefix: &Path) -> Option<Status> {
        let slot = self.slot(prefix);
        let guard = slot.lock().await;
        (*guard).clone()
    }

    /// Overwrite a record outside the runner (seeding, operator fix-ups).
    pub async fn put(&self, prefix: &Path, status: Status) {
        *self.slot(prefix).lock().await = Some(status);
    }
}

pub struct InMemorySession {
    prefix: PathBuf,
    guard: OwnedMutexGuard<Option<Status>>,
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    type Session = InMemorySession;

    async fn exclusive_session(&self, prefix: &Path) -> Result<InMemorySession, StoreError> {
        let slot = self.slot(prefix);
        let guard = match self.mode {
            AcquireMode::Wait => slot.lock_owned().await,
            AcquireMode::NonBlocking => slot
                .try_lock_owned()
                .map_err(|_| StoreError::Busy(prefix.to_path_buf()))?,
        };
        Ok(InMemorySession {
            prefix: prefix.to_path_buf(),
            guard,
        })
    }
}

#[async_trait]
impl StatusSession for InMemorySession {
    async fn load(&mut self) -> Result<Status, StoreError> {
        Ok((*self.guard).clone().unwrap_or_default())
    }

    async fn save(&mut self, status: &Status) -> Result<(), StoreError> {
        tracing::trace!(prefix = %self.prefix.display(), ?status, "in-memory save");
        *self.guard = Some(status.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_prefix_loads_default() {
        let store = InMemoryStatusStore::new();
        let mut session = store.exclusive_session(Path::new("a")).await.unwrap();
        assert_eq!(session.load().await.unwrap(), Status::default());
        drop(session);
        assert_eq!(store.snapshot(Path::new("a")).await, None);
    }

    #[tokio::test]
    async fn save_is_visible_to_next_session() {
        let store = InMemoryStatusStore::new();
        {
            let mut session = store.exclusive_session(Path::new("a")).await.unwrap();
            let mut status = session.load().await.unwrap();
            status.finished = true;
            session.save(&status).await.unwrap();
        }
        let mut session = store.exclusive_session(Path::new("a")).await.unwrap();
        assert!(session.load().await.unwrap().finished);
    }

    #[tokio::test]
    async fn non_blocking_mode_reports_busy() {
        let store = InMemoryStatusStore::with_mode(AcquireMode::NonBlocking);
        let held = store.exclusive_session(Path::new("a")).await.unwrap();

        let err = store.exclusive_session(Path::new("a")).await.err().unwrap();
        assert!(matches!(err, StoreError::Busy(p) if p == Path::new("a")));

        // 別の prefix は独立
        assert!(store.exclusive_session(Path::new("b")).await.is_ok());

        drop(held);
        assert!(store.exclusive_session(Path::new("a")).await.is_ok());
    }

    #[tokio::test]
    async fn wait_mode_blocks_until_release() {
        let store = InMemoryStatusStore::new();
        let held = store.exclusive_session(Path::new("a")).await.unwrap();

        let waiter = tokio::spawn({
            let store = store.clone();
            async move {
                let mut s = store.exclusive_session(Path::new("a")).await.unwrap();
                s.load().await.unwrap()
            }
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        assert_eq!(waiter.await.unwrap(), Status::default());
    }
}
