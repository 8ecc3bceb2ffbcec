//! Test doubles shared by the runner and batch tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::WorkError;
use crate::ports::Work;

/// What the next `force_download` call does.
pub(crate) enum Step {
    Ok,
    Fail(WorkError),
    Panic(&'static str),
    /// Signal `entered`, then wait for `release` before succeeding.
    Block {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    },
}

/// Work whose results are scripted per call. Unscripted calls succeed.
pub(crate) struct ScriptedWork {
    root: PathBuf,
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedWork {
    pub(crate) fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn then(self, step: Step) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Work for ScriptedWork {
    type Args = Vec<&'static str>;
    type Request = String;

    fn as_requests(&self, args: Self::Args) -> Vec<String> {
        args.into_iter().map(str::to_string).collect()
    }

    fn archive_prefix(&self, request: &String) -> PathBuf {
        self.root.join(request)
    }

    async fn force_download(&self, _request: &String) -> Result<(), WorkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::Ok);
        match step {
            Step::Ok => Ok(()),
            Step::Fail(e) => Err(e),
            Step::Panic(msg) => panic!("{msg}"),
            Step::Block { entered, release } => {
                entered.notify_one();
                release.notified().await;
                Ok(())
            }
        }
    }

    fn name(&self) -> &str {
        "tests::ScriptedWork"
    }
}
