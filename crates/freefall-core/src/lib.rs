//! freefall-core
//!
//! Crash-safe, idempotent execution of long-running work items.
//!
//! # モジュール構成
//! - **domain**: status record, deadline, work errors, outcomes
//! - **ports**: Work, StatusStore, Clock, IdGenerator
//! - **impls**: in-memory and file-backed status stores
//! - **app**: TaskRunner, BatchDriver, RequestLog, FreefallBuilder
//! - **config**: YAML configuration
//! - **error**: runner and batch errors

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;

pub use app::{BatchDriver, BatchSummary, FreefallBuilder, TaskRunner};
pub use config::FreefallConfig;
