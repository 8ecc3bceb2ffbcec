//! DemoWork - a stand-in downloader driven by request names.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use freefall_core::domain::{Deadline, WorkError};
use freefall_core::ports::Work;

const RESULT_FILE: &str = "result.txt";
const FIRST_PART_FILE: &str = "part-1.txt";

/// Back-off asked for by `flaky-*` requests.
const FLAKY_RETRY_AFTER_SECS: i64 = 60;

pub struct DemoWork {
    archive: PathBuf,
}

impl DemoWork {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
        }
    }
}

#[async_trait]
impl Work for DemoWork {
    type Args = Vec<String>;
    type Request = String;

    fn as_requests(&self, names: Vec<String>) -> Vec<String> {
        names
    }

    fn archive_prefix(&self, name: &String) -> PathBuf {
        self.archive.join(name)
    }

    async fn force_download(&self, name: &String) -> Result<(), WorkError> {
        let prefix = self.archive_prefix(name);

        if name.starts_with("broken-") {
            return Err(WorkError::resource(format!("{name}: source is gone")));
        }
        if name.starts_with("flaky-") {
            let retry_at = Deadline::new(Utc::now() + Duration::seconds(FLAKY_RETRY_AFTER_SECS));
            return Err(WorkError::temporary(
                format!("{name}: service busy"),
                Some(retry_at),
            ));
        }

        tokio::fs::create_dir_all(&prefix).await?;
        if name.starts_with("partial-") {
            let first = prefix.join(FIRST_PART_FILE);
            if !tokio::fs::try_exists(&first).await? {
                tokio::fs::write(&first, "part 1\n").await?;
                // 次回の起動ですぐ続きを取る
                return Err(WorkError::partially_completed("1/2 parts", None));
            }
        }

        tokio::fs::write(prefix.join(RESULT_FILE), format!("{name}\n")).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "freefall::demo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freefall_core::domain::ErrorKind;

    #[tokio::test]
    async fn plain_names_write_a_result() {
        let tmp = tempfile::tempdir().unwrap();
        let work = DemoWork::new(tmp.path());
        work.force_download(&"a".to_string()).await.unwrap();
        let text = std::fs::read_to_string(tmp.path().join("a").join(RESULT_FILE)).unwrap();
        assert_eq!(text, "a\n");
    }

    #[tokio::test]
    async fn partial_names_take_two_calls() {
        let tmp = tempfile::tempdir().unwrap();
        let work = DemoWork::new(tmp.path());
        let name = "partial-x".to_string();

        let err = work.force_download(&name).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartiallyCompleted);
        assert!(!tmp.path().join(&name).join(RESULT_FILE).exists());

        work.force_download(&name).await.unwrap();
        assert!(tmp.path().join(&name).join(RESULT_FILE).exists());
    }

    #[tokio::test]
    async fn flaky_and_broken_names_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let work = DemoWork::new(tmp.path());

        let err = work.force_download(&"flaky-1".to_string()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemporaryResource);
        assert!(err.waiting_until().unwrap().to_utc() > Utc::now());

        let err = work.force_download(&"broken-1".to_string()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
    }
}
