//! App - アプリケーション層
//!
//! ports を組み合わせて 1 リクエストのライフサイクルとバッチ処理を実装します。
//!
//! # 主要コンポーネント
//! - **TaskRunner**: admission → execution → resolution の状態遷移
//! - **BatchDriver**: リクエスト列を順に処理し、outcome をログに振り分ける
//! - **RequestLog**: リクエストごとのログファイル
//! - **FreefallBuilder**: ワイヤリングと起動時検証

pub mod batch;
pub mod builder;
pub mod request_log;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use self::batch::{BatchDriver, BatchSummary};
pub use self::builder::{BuildError, FreefallBuilder};
pub use self::request_log::RequestLog;
pub use self::runner::TaskRunner;
