//! FreefallBuilder - ワイヤリングと起動時検証
//!
//! Work と StatusStore を受け取り、設定を検証してから BatchDriver を組み立てる。
//! 設定の誤りは build() の時点で BuildError になる（Fail-fast）。

use std::sync::Arc;

use super::{BatchDriver, TaskRunner};
use crate::config::{ConfigError, FreefallConfig};
use crate::ports::{Clock, StatusStore, SystemClock, Work};

/// FreefallBuilder は BatchDriver を構築
///
/// # 使用例
/// ```ignore
/// let driver = FreefallBuilder::new(work, FileStatusStore::new())
///     .config(FreefallConfig::load(None)?)
///     .build()?;
/// let summary = driver.download(args).await?;
/// ```
pub struct FreefallBuilder<W, S> {
    work: W,
    store: S,
    clock: Option<Arc<dyn Clock>>,
    config: FreefallConfig,
}

/// BuildError はドライバ構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl<W: Work, S: StatusStore> FreefallBuilder<W, S> {
    pub fn new(work: W, store: S) -> Self {
        Self {
            work,
            store,
            clock: None,
            config: FreefallConfig::default(),
        }
    }

    pub fn config(mut self, config: FreefallConfig) -> Self {
        self.config = config;
        self
    }

    /// テスト用に時計を差し替える
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 設定を検証して BatchDriver を生成
    pub fn build(self) -> Result<BatchDriver<W, S>, BuildError> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let runner = TaskRunner::with_clock(self.work, self.store, clock)
            .with_config(self.config.runner);

        tracing::debug!(work = runner.work().name(), "batch driver built");
        Ok(BatchDriver::new(runner, self.config.batch))
    }
}
