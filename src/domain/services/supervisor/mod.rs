//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Owner of fire-and-forget background work. Every task is tracked until it finishes; failures
// are logged and counted, never propagated. Callers can await the moment nothing is running.
//
// | Component        | Description                                                  |
// |------------------|--------------------------------------------------------------|
// | TaskSupervisor   | Spawns tracked tasks and waits for idleness                  |
//--------------------------------------------------------------------------------------------------

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

/// Tracks background tasks spawned on the current tokio runtime.
#[derive(Clone)]
pub struct TaskSupervisor {
    tracker: TaskTracker,
    failures: Arc<AtomicUsize>,
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        let tracker = TaskTracker::new();
        // Closed trackers still accept tasks; closing only lets `wait` resolve once empty.
        tracker.close();
        Self {
            tracker,
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TaskSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `fut` as a tracked task. An `Err` result is logged under `name`.
    pub fn spawn<F, E>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let failures = self.failures.clone();
        self.tracker.spawn(async move {
            match fut.await {
                Ok(()) => debug!(task = name, "background task finished"),
                Err(e) => {
                    failures.fetch_add(1, Ordering::SeqCst);
                    error!(task = name, error = %e, "background task failed");
                }
            }
        });
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Number of tasks that finished with an error so far.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Resolves once no tracked task is running.
    pub async fn wait_idle(&self) {
        self.tracker.wait().await;
    }
}
