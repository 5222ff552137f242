//! Deferred session eviction.
//!
//! One background task owns a min-heap of `(deadline, session_id)` entries and
//! sleeps until the nearest deadline. Arming a new entry wakes the task so it
//! can re-evaluate which deadline is nearest.

use crate::store::{remove_session, Sessions};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

type ExpiryQueue = Arc<Mutex<BinaryHeap<Reverse<(Instant, String)>>>>;

/// Evicts each armed session from the store once its deadline passes.
pub struct ExpiryScheduler {
    queue: ExpiryQueue,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ExpiryScheduler {
    /// Start the eviction task. Must be called from within a Tokio runtime.
    pub fn spawn(sessions: Sessions) -> Self {
        let queue: ExpiryQueue = Arc::new(Mutex::new(BinaryHeap::new()));
        let wake = Arc::new(Notify::new());
        let task = tokio::spawn(run_evictions(sessions, queue.clone(), wake.clone()));
        Self { queue, wake, task }
    }

    /// Arm exactly one eviction for `session_id` at `deadline`.
    pub async fn arm(&self, session_id: &str, deadline: Instant) {
        self.queue
            .lock()
            .await
            .push(Reverse((deadline, session_id.to_string())));
        self.wake.notify_one();
        debug!(session_id, "Eviction armed");
    }

    /// Number of evictions that have not fired yet.
    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_evictions(sessions: Sessions, queue: ExpiryQueue, wake: Arc<Notify>) {
    loop {
        let next = queue.lock().await.peek().map(|Reverse((at, _))| *at);
        match next {
            None => {
                wake.notified().await;
                continue;
            }
            Some(at) => {
                tokio::select! {
                    _ = sleep_until(at) => {}
                    // An earlier deadline may have been armed.
                    _ = wake.notified() => continue,
                }
            }
        }

        for session_id in pop_due(&queue, Instant::now()).await {
            // Unconditional: an explicit stop may already have removed it.
            if remove_session(&sessions, &session_id).await {
                info!(session_id = %session_id, "Session expired and evicted");
            }
        }
    }
}

async fn pop_due(queue: &ExpiryQueue, now: Instant) -> Vec<String> {
    let mut queue = queue.lock().await;
    let mut due = Vec::new();
    while let Some(Reverse((at, _))) = queue.peek() {
        if *at > now {
            break;
        }
        if let Some(Reverse((_, id))) = queue.pop() {
            due.push(id);
        }
    }
    due
}
