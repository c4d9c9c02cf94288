use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use timegrid_core::CellId;
use tokio::task::JoinHandle;

use crate::lock;

struct Armed {
    seq: u64,
    handle: JoinHandle<()>,
}

type Registry = Arc<Mutex<HashMap<CellId, Armed>>>;

/// Counts an expired timer's action while it runs
struct Running(Arc<AtomicUsize>);

impl Running {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Running(Arc::clone(counter))
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Per-cell debounce timers.
///
/// At most one timer is armed per cell. Rescheduling replaces (and aborts)
/// the previous timer; an expiring timer removes its own entry before it
/// runs its action, so an edit arriving during the save starts a new cycle.
pub struct DebounceScheduler {
    delay: Duration,
    timers: Registry,
    running: Arc<AtomicUsize>,
    next_seq: AtomicU64,
}

impl DebounceScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timers: Arc::new(Mutex::new(HashMap::new())),
            running: Arc::new(AtomicUsize::new(0)),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm (or re-arm) the timer for `cell`.
    ///
    /// `on_expiry` is only called once the quiet period elapses, so it
    /// should read whatever value the cell holds at that point.
    pub fn schedule<F, Fut>(&self, cell: CellId, on_expiry: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);
        let running = Arc::clone(&self.running);
        let delay = self.delay;
        let key = cell.clone();

        // Insert under the same lock the task checks, so a replaced timer
        // that already woke up sees the newer seq and bails.
        let mut armed = lock(&self.timers);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _running = {
                let mut timers = lock(&timers);
                match timers.get(&key) {
                    Some(entry) if entry.seq == seq => {
                        timers.remove(&key);
                        Running::start(&running)
                    }
                    _ => return,
                }
            };
            tracing::debug!(cell = %key, "Debounce expired");
            on_expiry().await;
        });

        if let Some(previous) = armed.insert(cell, Armed { seq, handle }) {
            previous.handle.abort();
        }
    }

    /// Disarm the timer for `cell`. Returns whether one was pending.
    pub fn cancel(&self, cell: &CellId) -> bool {
        match lock(&self.timers).remove(cell) {
            Some(entry) => {
                entry.handle.abort();
                tracing::debug!(%cell, "Debounce cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, cell: &CellId) -> bool {
        lock(&self.timers).contains_key(cell)
    }

    /// Cells with an armed timer
    pub fn pending(&self) -> Vec<CellId> {
        lock(&self.timers).keys().cloned().collect()
    }

    /// No timer armed and no expired action still running
    pub fn is_idle(&self) -> bool {
        // Checked under the registry lock: an action starts running in the
        // same critical section that removes its timer.
        let timers = lock(&self.timers);
        timers.is_empty() && self.running.load(Ordering::SeqCst) == 0
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        for (_, entry) in lock(&self.timers).drain() {
            entry.handle.abort();
        }
    }
}
