//! Run scheduling and the single-flight guard.
//!
//! At most one pipeline run is active at a time, process-wide. The guard
//! is an explicit idle/running token owned here, not ambient global state:
//! `try_acquire` flips idle -> running atomically and hands back a token
//! that flips it back on drop, so the flag clears on every exit path,
//! including panics inside a run.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Atomic idle/running state for the single-flight run.
#[derive(Debug, Default)]
pub struct RunGuard {
    running: AtomicBool,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the running state. `None` means a run is already active.
    pub fn try_acquire(&self) -> Option<RunToken<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(RunToken { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Held for the duration of a run; releases the guard on drop.
pub struct RunToken<'a> {
    guard: &'a RunGuard,
}

impl Drop for RunToken<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

/// Fixed-interval trigger around the pipeline, plus one immediate run at
/// startup.
pub struct Scheduler {
    guard: RunGuard,
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            guard: RunGuard::new(),
            interval,
        }
    }

    pub fn guard(&self) -> &RunGuard {
        &self.guard
    }

    /// Run `work` if the guard is idle; otherwise drop it unstarted and
    /// log the skip. The in-flight run is unaffected either way.
    pub async fn trigger(&self, work: impl Future<Output = ()>) {
        let Some(_token) = self.guard.try_acquire() else {
            info!("Scraping is already in progress; skipping this run");
            return;
        };
        info!("Starting news scraping run");
        work.await;
        info!("Run finished; waiting for next tick");
    }

    /// Loop forever: the first tick fires immediately, then every
    /// `interval`. Run errors are handled inside the pipeline and never
    /// reach this loop; a slow run simply makes the next tick a skip.
    pub async fn run<F, Fut>(&self, mut run_once: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            debug!("Scheduler tick");
            self.trigger(run_once()).await;
        }
    }
}
