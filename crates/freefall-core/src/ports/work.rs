//! Work port - 実際の処理（ダウンロードなど）
//!
//! One implementation per kind of work. It knows how to turn caller arguments
//! into requests, where a request's archive lives, and how to perform it.

use std::fmt::Display;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::WorkError;

/// Work は 1 種類の処理を表現
///
/// # 使用例
/// ```ignore
/// struct PageDownloader { root: PathBuf }
///
/// #[async_trait]
/// impl Work for PageDownloader {
///     type Args = Vec<String>;
///     type Request = String;
///
///     fn as_requests(&self, args: Self::Args) -> Vec<String> { args }
///
///     fn archive_prefix(&self, request: &String) -> PathBuf {
///         self.root.join(request)
///     }
///
///     async fn force_download(&self, request: &String) -> Result<(), WorkError> {
///         // ...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Work: Send + Sync {
    /// Caller-level arguments.
    type Args: Send;

    /// One unit of work. Immutable once produced.
    type Request: Display + Send + Sync;

    /// Translate arguments into concrete requests. Must be pure: calling it
    /// again with the same arguments yields the same requests.
    fn as_requests(&self, args: Self::Args) -> Vec<Self::Request>;

    /// Deterministic location scoping the request's status and log.
    /// Distinct requests must not share a prefix.
    fn archive_prefix(&self, request: &Self::Request) -> PathBuf;

    /// Perform the work. Return a `WorkError` variant to get the matching
    /// retry/failure bookkeeping.
    async fn force_download(&self, request: &Self::Request) -> Result<(), WorkError>;

    /// Target used for this work's log lines.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
