//! Debounced task handles
//!
//! A [`Debouncer`] belongs to whoever schedules work through it (one per
//! editor, one per service date). Scheduling replaces any task still waiting
//! out its delay, so a burst of edits produces a single save. A task that has
//! already started is left to finish. Dropping the handle cancels whatever is
//! still waiting.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct Pending {
    handle: JoinHandle<()>,
    started: Arc<AtomicBool>,
}

/// Runs only the most recently scheduled task, after a quiet period
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any waiting task with `task`, to run after the delay
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let delay = self.delay;
        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flag.store(true, Ordering::SeqCst);
            task.await;
        });

        self.pending = Some(Pending { handle, started });
    }

    /// Cancel a task still waiting out its delay; true if one was cancelled
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) if !pending.started.load(Ordering::SeqCst) => {
                pending.handle.abort();
                true
            }
            _ => false,
        }
    }

    /// A scheduled task has not finished yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map_or(false, |p| !p.handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
