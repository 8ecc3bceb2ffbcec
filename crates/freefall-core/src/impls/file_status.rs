//! FileStatusStore - archive ディレクトリに status.json を置く store
//!
//! Layout under each request's archive prefix:
//! - `status.lock`: advisory lock file (`fs2` exclusive lock = the session)
//! - `status.json`: the record, replaced atomically via a temp file + rename
//!
//! ロック取得などのブロッキング処理は `spawn_blocking` で実行する。

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;

use super::inmem_status::AcquireMode;
use crate::domain::Status;
use crate::ports::{StatusSession, StatusStore, StoreError};

const LOCK_FILE: &str = "status.lock";
const STATUS_FILE: &str = "status.json";
const TEMP_FILE: &str = "status.json.tmp";

#[derive(Debug, Clone, Default)]
pub struct FileStatusStore {
    mode: AcquireMode,
}

impl FileStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: AcquireMode) -> Self {
        Self { mode }
    }

    /// Read a record without taking the lock (inspection only).
    pub fn peek(prefix: &Path) -> Result<Option<Status>, StoreError> {
        read_status(&prefix.join(STATUS_FILE))
    }
}

/// Holds the exclusive lock until dropped.
#[derive(Debug)]
pub struct FileSession {
    dir: PathBuf,
    lock: File,
}

impl Drop for FileSession {
    fn drop(&mut self) {
        // close でも解放されるが、明示的に unlock しておく
        if let Err(e) = FileExt::unlock(&self.lock) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to unlock status");
        }
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == fs2::lock_contended_error().kind()
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn read_status(path: &Path) -> Result<Option<Status>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn write_status(dir: &Path, status: &Status) -> Result<(), StoreError> {
    let tmp = dir.join(TEMP_FILE);
    let json = serde_json::to_vec_pretty(status)
        .map_err(|e| StoreError::OperationFailed(format!("encode status: {e}")))?;

    let mut file = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
    file.write_all(&json).map_err(|e| StoreError::io(&tmp, e))?;
    file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;
    drop(file);

    let target = dir.join(STATUS_FILE);
    fs::rename(&tmp, &target).map_err(|e| StoreError::io(&target, e))
}

async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::OperationFailed(format!("blocking task failed: {e}")))?
}

#[async_trait]
impl StatusStore for FileStatusStore {
    type Session = FileSession;

    async fn exclusive_session(&self, prefix: &Path) -> Result<FileSession, StoreError> {
        let dir = prefix.to_path_buf();
        let mode = self.mode;

        blocking(move || {
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
            let lock_path = dir.join(LOCK_FILE);
            let lock = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
                .map_err(|e| StoreError::io(&lock_path, e))?;

            match mode {
                AcquireMode::Wait => lock
                    .lock_exclusive()
                    .map_err(|e| StoreError::io(&lock_path, e))?,
                AcquireMode::NonBlocking => lock.try_lock_exclusive().map_err(|e| {
                    if is_contended(&e) {
                        StoreError::Busy(dir.clone())
                    } else {
                        StoreError::io(&lock_path, e)
                    }
                })?,
            }

            tracing::trace!(dir = %dir.display(), "status lock acquired");
            Ok(FileSession { dir, lock })
        })
        .await
    }
}

#[async_trait]
impl StatusSession for FileSession {
    async fn load(&mut self) -> Result<Status, StoreError> {
        let path = self.dir.join(STATUS_FILE);
        let status = blocking(move || read_status(&path)).await?;
        Ok(status.unwrap_or_default())
    }

    async fn save(&mut self, status: &Status) -> Result<(), StoreError> {
        let dir = self.dir.clone();
        let status = status.clone();
        blocking(move || write_status(&dir, &status)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Deadline;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn missing_record_loads_default_and_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = tmp.path().join("req-1");

        let store = FileStatusStore::new();
        let mut session = store.exclusive_session(&prefix).await.unwrap();
        assert_eq!(session.load().await.unwrap(), Status::default());
        assert!(prefix.join(LOCK_FILE).exists());
        assert!(!prefix.join(STATUS_FILE).exists());
    }

    #[tokio::test]
    async fn save_then_load_in_new_session() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = tmp.path().join("req-1");
        let store = FileStatusStore::new();

        let at = Deadline::new(Utc.with_ymd_and_hms(2031, 2, 3, 4, 5, 6).unwrap());
        {
            let mut session = store.exclusive_session(&prefix).await.unwrap();
            let mut status = session.load().await.unwrap();
            status.failed = true;
            status.waiting_until = Some(at);
            session.save(&status).await.unwrap();
        }

        let mut session = store.exclusive_session(&prefix).await.unwrap();
        let status = session.load().await.unwrap();
        assert!(status.failed);
        assert_eq!(status.waiting_until, Some(at));
        assert!(!prefix.join(TEMP_FILE).exists());
    }

    #[tokio::test]
    async fn non_blocking_reports_busy_while_locked() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = tmp.path().join("req-1");
        let store = FileStatusStore::with_mode(AcquireMode::NonBlocking);

        let held = store.exclusive_session(&prefix).await.unwrap();
        let err = store.exclusive_session(&prefix).await.unwrap_err();
        assert!(matches!(err, StoreError::Busy(_)));

        drop(held);
        assert!(store.exclusive_session(&prefix).await.is_ok());
    }

    #[tokio::test]
    async fn corrupt_record_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = tmp.path().join("req-1");
        fs::create_dir_all(&prefix).unwrap();
        fs::write(
            prefix.join(STATUS_FILE),
            r#"{"waiting_until":"2024-01-01T00:00:00"}"#,
        )
        .unwrap();

        let store = FileStatusStore::new();
        let mut session = store.exclusive_session(&prefix).await.unwrap();
        let err = session.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(err.to_string().contains("no timezone"));
    }

    #[test]
    fn peek_reads_without_lock() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(FileStatusStore::peek(tmp.path()).unwrap(), None);

        fs::write(tmp.path().join(STATUS_FILE), r#"{"finished":true}"#).unwrap();
        let status = FileStatusStore::peek(tmp.path()).unwrap().unwrap();
        assert!(status.finished);
    }
}
