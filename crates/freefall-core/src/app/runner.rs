//! TaskRunner - one request's lifecycle.
//!
//! # フロー
//! 1. admission（排他セッション 1 回）: load → skip 判定 → claim → save
//! 2. execution（ロックなし）: `Work::force_download`
//! 3. resolution（排他セッション 1 回、必ず実行）: reload → outcome 反映 → release → save
//!
//! A crash between 1 and 3 leaves `processing = true` on disk. Nothing here
//! reclaims such records; the next admission reports `AlreadyProcessing` until
//! an operator resets the record.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, SubsecRound};
use futures::FutureExt;

use super::RequestLog;
use crate::config::RunnerConfig;
use crate::domain::{AttemptId, Outcome, RetryCause, SkipReason, Status, WorkError};
use crate::error::{Phase, RunnerError};
use crate::ports::{
    Clock, IdGenerator, StatusSession, StatusStore, StoreError, SystemClock, UlidGenerator, Work,
};

/// Slack added to "now" before comparing against `waiting_until`.
const GRACE_SECONDS: i64 = 1;

/// Resolution must persist; a busy store is retried this many times.
const RESOLUTION_BUSY_RETRIES: u32 = 200;
const RESOLUTION_BUSY_BACKOFF: StdDuration = StdDuration::from_millis(25);

enum Admission {
    Granted(AttemptId),
    Skipped(SkipReason),
}

pub struct TaskRunner<W, S> {
    work: W,
    store: S,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: RunnerConfig,
}

impl<W: Work, S: StatusStore> TaskRunner<W, S> {
    pub fn new(work: W, store: S) -> Self {
        Self::with_clock(work, store, Arc::new(SystemClock))
    }

    pub fn with_clock(work: W, store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            work,
            store,
            ids: Arc::new(UlidGenerator::new(clock.clone())),
            clock,
            config: RunnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn work(&self) -> &W {
        &self.work
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open the request's log under its archive prefix.
    pub fn open_log(&self, request: &W::Request) -> Result<RequestLog, RunnerError> {
        let prefix = self.work.archive_prefix(request);
        RequestLog::open(
            &prefix,
            &self.config.log_file_name,
            self.work.name(),
            request.to_string(),
        )
        .map_err(|source| RunnerError::Log {
            path: prefix.join(&self.config.log_file_name),
            source,
        })
    }

    /// Process one request with its own log handle, closed before returning.
    pub async fn process(&self, request: &W::Request) -> Result<Outcome, RunnerError> {
        let log = self.open_log(request)?;
        self.process_with_log(request, &log).await
    }

    /// Process one request, writing to a log handle owned by the caller.
    pub async fn process_with_log(
        &self,
        request: &W::Request,
        log: &RequestLog,
    ) -> Result<Outcome, RunnerError> {
        let prefix = self.work.archive_prefix(request);

        let attempt = match self.admit(&prefix, request).await? {
            Admission::Granted(attempt) => attempt,
            Admission::Skipped(reason) => {
                log.debug(format_args!("admission refused: {reason}"));
                return Ok(Outcome::Skipped(reason));
            }
        };
        log.debug(format_args!("{attempt}: admitted"));

        // panic も Unexpected として resolution まで持っていく
        let result = AssertUnwindSafe(self.work.force_download(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_error(payload)));
        let outcome = Outcome::from_work(result);

        let status = self.resolve(&prefix, request, &outcome).await.inspect_err(|e| {
            log.error(format_args!("{attempt}: status left in progress: {e}"));
        })?;
        log.debug(format_args!("{attempt}: resolved {:?} -> {status:?}", outcome.kind()));

        Ok(outcome)
    }

    async fn admit(&self, prefix: &Path, request: &W::Request) -> Result<Admission, RunnerError> {
        let store_err = |source| store_error(request, Phase::Admission, source);

        let mut session = match self.store.exclusive_session(prefix).await {
            Ok(session) => session,
            // 待たずに取れない = 誰かが処理中
            Err(StoreError::Busy(_)) => {
                return Ok(Admission::Skipped(SkipReason::AlreadyProcessing));
            }
            Err(source) => return Err(store_err(source)),
        };
        let mut status = session.load().await.map_err(store_err)?;

        if status.processing {
            return Ok(Admission::Skipped(SkipReason::AlreadyProcessing));
        }
        if status.finished {
            return Ok(Admission::Skipped(SkipReason::AlreadyFinished));
        }
        let not_before = self.clock.now().trunc_subsecs(0) + Duration::seconds(GRACE_SECONDS);
        if let Some(deadline) = status.pending_deadline(not_before) {
            return Ok(Admission::Skipped(SkipReason::TemporaryUnavailable(deadline)));
        }

        status.claim();
        session.save(&status).await.map_err(store_err)?;
        Ok(Admission::Granted(self.ids.generate_attempt_id()))
    }

    async fn resolve(
        &self,
        prefix: &Path,
        request: &W::Request,
        outcome: &Outcome,
    ) -> Result<Status, RunnerError> {
        let store_err = |source| store_error(request, Phase::Resolution, source);

        let mut session = self.resolution_session(prefix).await.map_err(store_err)?;
        let mut status = session.load().await.map_err(store_err)?;
        apply_outcome(&mut status, outcome);
        status.release();
        session.save(&status).await.map_err(store_err)?;
        Ok(status)
    }

    async fn resolution_session(&self, prefix: &Path) -> Result<S::Session, StoreError> {
        let mut retries = 0;
        loop {
            match self.store.exclusive_session(prefix).await {
                Err(StoreError::Busy(_)) if retries < RESOLUTION_BUSY_RETRIES => {
                    retries += 1;
                    tokio::time::sleep(RESOLUTION_BUSY_BACKOFF).await;
                }
                other => return other,
            }
        }
    }
}

/// Rewrite the status for the result of an attempt. `processing` is left to the caller.
fn apply_outcome(status: &mut Status, outcome: &Outcome) {
    match outcome {
        Outcome::Success => {
            status.finished = true;
            status.failed = false;
        }
        Outcome::Retryable(retry) => {
            status.waiting_until = Some(retry.waiting_until);
            match retry.cause {
                RetryCause::PartiallyCompleted => {
                    status.finished = false;
                    status.failed = false;
                }
                RetryCause::TemporaryResource => status.failed = true,
            }
        }
        Outcome::Failed(WorkError::Resource { .. }) => {
            status.finished = true;
            status.failed = true;
        }
        Outcome::Failed(_) => status.failed = true,
        Outcome::Skipped(_) => {}
    }
}

fn store_error<R: ToString + ?Sized>(request: &R, phase: Phase, source: StoreError) -> RunnerError {
    RunnerError::Store {
        request: request.to_string(),
        phase,
        source,
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> WorkError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    WorkError::unexpected(format!("work panicked: {message}"))
}
