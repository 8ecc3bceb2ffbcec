//! BatchDriver - run a sequence of requests through the runner.
//!
//! The driver never touches status. It opens each request's log, lets the
//! runner process the request, writes the outcome to the log at the level its
//! kind deserves, and decides whether a failure travels on to the caller.

use std::collections::HashMap;
use std::fmt;

use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;

use super::{RequestLog, TaskRunner};
use crate::config::BatchConfig;
use crate::domain::{Outcome, OutcomeKind, RetryCause, SkipReason};
use crate::error::BatchError;
use crate::ports::{StatusStore, Work};

pub struct BatchDriver<W, S> {
    runner: TaskRunner<W, S>,
    config: BatchConfig,
}

/// Counts per outcome kind for one drained batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    counts: HashMap<OutcomeKind, usize>,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        *self.counts.entry(outcome.kind()).or_default() += 1;
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.counts.iter().collect();
        kinds.sort_by_key(|(kind, _)| format!("{kind:?}"));
        write!(f, "{} request(s)", self.total())?;
        for (kind, n) in kinds {
            write!(f, ", {kind:?}={n}")?;
        }
        Ok(())
    }
}

impl<W: Work, S: StatusStore> BatchDriver<W, S> {
    pub fn new(runner: TaskRunner<W, S>, config: BatchConfig) -> Self {
        Self { runner, config }
    }

    pub fn runner(&self) -> &TaskRunner<W, S> {
        &self.runner
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Lazily process `requests` in order, one outcome per request.
    ///
    /// A propagated error is the last item: the stream ends after it.
    /// Calling `run` again re-evaluates every request from its stored status.
    pub fn run<'a, I>(
        &'a self,
        requests: I,
    ) -> impl Stream<Item = Result<Outcome, BatchError>> + 'a
    where
        I: IntoIterator<Item = W::Request>,
        I::IntoIter: 'a,
    {
        stream::unfold(
            (requests.into_iter(), false),
            move |(mut requests, stopped)| async move {
                if stopped {
                    return None;
                }
                let request = requests.next()?;
                let item = self.run_one(&request).await;
                let stop = item.is_err();
                Some((item, (requests, stop)))
            },
        )
    }

    /// Derive requests from `args` and drain the whole batch.
    pub async fn download(&self, args: W::Args) -> Result<BatchSummary, BatchError> {
        let requests = self.runner.work().as_requests(args);
        let mut summary = BatchSummary::default();

        let outcomes = self.run(requests);
        futures::pin_mut!(outcomes);
        while let Some(item) = outcomes.next().await {
            summary.record(&item?);
        }

        tracing::info!(%summary, "batch finished");
        Ok(summary)
    }

    /// Process one request and dispatch its outcome.
    pub async fn run_one(&self, request: &W::Request) -> Result<Outcome, BatchError> {
        let log = self.runner.open_log(request)?;
        let result = match self.runner.process_with_log(request, &log).await {
            Ok(outcome) => self.dispatch(request, outcome, &log),
            Err(e) => {
                log.error(&e);
                Err(e.into())
            }
        };
        log.close();
        result
    }

    fn dispatch(
        &self,
        request: &W::Request,
        outcome: Outcome,
        log: &RequestLog,
    ) -> Result<Outcome, BatchError> {
        match outcome {
            Outcome::Success => log.info("Finished successfully"),
            Outcome::Skipped(SkipReason::AlreadyFinished) => log.info("Already finished"),
            Outcome::Skipped(SkipReason::AlreadyProcessing) => log.info("Already in progress"),
            Outcome::Skipped(SkipReason::TemporaryUnavailable(at)) => log.info(format_args!(
                "Temporarily unavailable, retry later (not before {at})"
            )),
            Outcome::Retryable(ref retry) => match retry.cause {
                RetryCause::PartiallyCompleted => log.info(format_args!(
                    "Partially completed: {}; continue after {}",
                    retry.message, retry.waiting_until
                )),
                RetryCause::TemporaryResource => log.info(format_args!(
                    "Temporarily unavailable: {}; retry after {}",
                    retry.message, retry.waiting_until
                )),
            },
            Outcome::Failed(error) => {
                let kind = error.kind();
                if kind.is_resource() {
                    log.warn(format_args!("{kind}: {error}"));
                    log.debug(format_args!("Detail: {}", error.detail()));
                } else {
                    log.error(error.detail());
                }

                if self.config.suppresses(kind) {
                    return Ok(Outcome::Failed(error));
                }
                return Err(BatchError::Work {
                    request: request.to_string(),
                    error,
                });
            }
        }
        Ok(outcome)
    }
}
