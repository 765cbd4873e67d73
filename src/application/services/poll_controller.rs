//! Recurring status-check timer
//!
//! One `PollController` belongs to exactly one payment session and is the
//! only owner of that session's timer. Centralizing timer ownership here is
//! what keeps a second, racing timer unrepresentable: `start` is idempotent
//! and `stop` is the single release point for the handle.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Outcome of recording one completed status check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    pub attempts_used: u32,
    pub exhausted: bool,
}

/// Owner of a session's single recurring timer and its attempt budget
pub struct PollController {
    interval: Duration,
    max_attempts: u32,
    attempts: AtomicU32,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl PollController {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            attempts: AtomicU32::new(0),
            timer: Mutex::new(None),
        }
    }

    /// Begin the repeating timer.
    ///
    /// Each tick awaits `on_tick` to completion before the next tick is
    /// taken, and ticks that come due while a check is still running are
    /// skipped rather than queued. `on_tick` returns whether polling should
    /// continue; returning `false` ends the timer task.
    ///
    /// Idempotent: calling `start` while a timer is live is a no-op and
    /// never creates a second timer.
    pub fn start<F, Fut>(&self, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let mut timer = self.lock_timer();
        if let Some(handle) = timer.as_ref() {
            if !handle.is_finished() {
                debug!("poll timer already running, ignoring start");
                return;
            }
        }

        let interval = self.interval;
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if !on_tick().await {
                    break;
                }
            }
        });
        *timer = Some(handle);
    }

    /// Record one completed status check against the budget.
    ///
    /// Called exactly once per check that resolved and was applied.
    pub fn record_attempt(&self) -> AttemptRecord {
        let attempts_used = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        AttemptRecord {
            attempts_used,
            exhausted: attempts_used >= self.max_attempts,
        }
    }

    /// Cancel the active timer, if any. Safe to call when idle.
    pub fn stop(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
    }

    /// Stop the timer and zero the attempt counter (restart path)
    pub fn reset(&self) {
        self.stop();
        self.attempts.store(0, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.lock_timer()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PollController {
    fn drop(&mut self) {
        self.stop();
    }
}
