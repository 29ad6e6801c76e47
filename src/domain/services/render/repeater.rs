//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Per-id delayed repeats. Scheduling an id fires the task once after each configured delay,
// counted from the moment of scheduling. Scheduling the same id again cancels the timers of the
// previous schedule that have not fired yet; an attempt that is already running is left to
// finish.
//
//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name        | Description                                       | Key Methods         |
// |-------------|---------------------------------------------------|---------------------|
// | Repeater    | Debounced per-id repeat scheduler                 | schedule            |
// |             |                                                   | cancel_all          |
//--------------------------------------------------------------------------------------------------

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Work run for an id each time one of its timers fires.
pub type RepeatTask = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

/// Cancellation token of the live schedule of each id.
type Schedules = HashMap<String, CancellationToken>;

/// Debounced repeat scheduler.
#[derive(Clone)]
pub struct Repeater {
    intervals: Arc<Vec<Duration>>,
    task: RepeatTask,
    schedules: Arc<Mutex<Schedules>>,
}

impl Repeater {
    pub fn new(mut intervals: Vec<Duration>, task: RepeatTask) -> Self {
        intervals.sort();
        Self {
            intervals: Arc::new(intervals),
            task,
            schedules: Arc::new(Mutex::new(Schedules::default())),
        }
    }

    /// Replaces any pending schedule for `id` with a fresh one.
    pub fn schedule(&self, id: &str) {
        if self.intervals.is_empty() {
            return;
        }

        let token = CancellationToken::new();
        {
            let mut schedules = self.schedules.lock();
            if let Some(previous) = schedules.insert(id.to_string(), token.clone()) {
                previous.cancel();
                debug!(id, "pending repeats replaced");
            }
        }

        let start = Instant::now();
        let intervals = self.intervals.clone();
        let task = self.task.clone();
        let schedules = self.schedules.clone();
        let id = id.to_string();

        tokio::spawn(async move {
            for delay in intervals.iter() {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = sleep_until(start + *delay) => {}
                }
                debug!(id = %id, delay_secs = delay.as_secs_f64(), "repeat fired");
                // Awaited outside the select so cancellation cannot interrupt a running attempt.
                task(id.clone()).await;
                if token.is_cancelled() {
                    break;
                }
            }

            // A token that is still live is the one stored for this id.
            let mut schedules = schedules.lock();
            if !token.is_cancelled() {
                schedules.remove(&id);
            }
        });
    }

    /// Cancels every pending schedule.
    pub fn cancel_all(&self) {
        for (_, token) in self.schedules.lock().drain() {
            token.cancel();
        }
    }

    /// Number of ids with a pending schedule.
    pub fn pending(&self) -> usize {
        self.schedules.lock().len()
    }
}
