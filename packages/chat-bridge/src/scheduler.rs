//! Fixed-rate poll scheduling shared by every bridge.
//!
//! A [`PollTask`] owns one background loop. Each tick calls the bridge's
//! tick function synchronously and spawns the future it returns, so a slow
//! network call never delays the schedule and an in-flight fetch is never
//! aborted. Stopping only ends the schedule; a fetch already running still
//! completes and may write state that nobody reads any more.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Lifecycle of a bridge, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    Stopped,
    Scheduled,
    Fetching,
    Applying,
}

impl BridgeState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => BridgeState::Scheduled,
            2 => BridgeState::Fetching,
            3 => BridgeState::Applying,
            _ => BridgeState::Stopped,
        }
    }
}

/// Poll period for a configured interval, clamped to the bridge's floor.
pub fn effective_interval(floor_secs: u64, configured_secs: u64) -> Duration {
    Duration::from_secs(configured_secs.max(floor_secs).max(1))
}

#[derive(Debug, Default)]
struct StateCell(AtomicU8);

impl StateCell {
    fn get(&self) -> BridgeState {
        BridgeState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn set(&self, state: BridgeState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Update unless the task has been stopped in the meantime.
    fn set_if_running(&self, state: BridgeState) {
        let _ = self.0.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
            (cur != BridgeState::Stopped as u8).then_some(state as u8)
        });
    }
}

/// Handle given to each tick so it can report progress.
#[derive(Clone)]
pub struct Tick {
    pub number: u64,
    state: Arc<StateCell>,
}

impl Tick {
    /// The fetch finished and results are being handed to the host.
    pub fn applying(&self) {
        self.state.set_if_running(BridgeState::Applying);
    }
}

/// Read-only view of a task's state, cheap to clone into status reporting.
#[derive(Clone)]
pub struct TaskProbe {
    state: Arc<StateCell>,
    ticks: Arc<AtomicU64>,
}

impl TaskProbe {
    pub fn state(&self) -> BridgeState {
        self.state.get()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }
}

/// A running fixed-rate schedule. Dropping the handle stops it.
pub struct PollTask {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    stopped: Arc<AtomicBool>,
    probe: TaskProbe,
}

impl PollTask {
    /// Start ticking after `warmup`, then every `period`.
    pub fn spawn<F, Fut>(name: &'static str, warmup: Duration, period: Duration, tick: F) -> Self
    where
        F: Fn(Tick) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let stopped = Arc::new(AtomicBool::new(false));
        let probe = TaskProbe {
            state: Arc::new(StateCell::default()),
            ticks: Arc::new(AtomicU64::new(0)),
        };
        probe.state.set(BridgeState::Scheduled);

        let loop_stopped = stopped.clone();
        let loop_probe = probe.clone();
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + warmup, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {
                        if loop_stopped.load(Ordering::SeqCst) {
                            break;
                        }
                        let number = loop_probe.ticks.fetch_add(1, Ordering::SeqCst) + 1;
                        loop_probe.state.set_if_running(BridgeState::Fetching);

                        let state = loop_probe.state.clone();
                        let fut = tick(Tick { number, state: state.clone() });
                        tokio::spawn(async move {
                            fut.await;
                            state.set_if_running(BridgeState::Scheduled);
                        });
                    }
                }
            }
            tracing::debug!(task = name, "[Scheduler] Poll loop exited");
        });

        tracing::debug!(
            task = name,
            warmup_ms = warmup.as_millis() as u64,
            period_secs = period.as_secs_f64(),
            "[Scheduler] Poll task scheduled"
        );

        Self {
            name,
            shutdown,
            stopped,
            probe,
        }
    }

    pub fn probe(&self) -> TaskProbe {
        self.probe.clone()
    }

    pub fn state(&self) -> BridgeState {
        self.probe.state()
    }

    pub fn ticks(&self) -> u64 {
        self.probe.ticks()
    }

    /// End the schedule. In-flight ticks are left to finish on their own.
    pub fn stop(self) {
        // Drop does the work.
    }

    fn halt(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.probe.state.set(BridgeState::Stopped);
        let _ = self.shutdown.send(true);
        tracing::debug!(task = self.name, "[Scheduler] Poll task stopped");
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.halt();
    }
}
