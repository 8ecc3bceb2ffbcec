//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStatusStore**: テスト・開発用（プロセス内の排他のみ）
//! - **FileStatusStore**: archive ディレクトリ上の status.json + ファイルロック
//!
//! Database- or lock-server-backed stores belong in their own crates and only
//! need to implement `StatusStore`.

pub mod file_status;
pub mod inmem_status;

pub use self::file_status::{FileSession, FileStatusStore};
pub use self::inmem_status::{AcquireMode, InMemorySession, InMemoryStatusStore};
