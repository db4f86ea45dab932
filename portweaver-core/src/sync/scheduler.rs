//! Interruptible polling scheduler
//!
//! A single loop runs one pass, then waits. The wait is the only thing that
//! can be interrupted: a manual trigger cuts it short and the same loop runs
//! the next pass at once, so two passes never overlap. All external requests
//! go through one command queue owned by the loop.

use crate::config::MANUAL_FOLLOWUP_INTERVAL_SECS;
use crate::sync::ReconciliationOutcome;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// What a finished pass tells the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub outcome: ReconciliationOutcome,
    /// Configured wait before the next pass, read fresh by the pass
    pub next_interval: Duration,
}

/// One unit of scheduled work
pub trait ReconcilePass: Send {
    fn run_pass(&mut self) -> impl Future<Output = PassReport> + Send;
}

/// Commands to control the scheduler loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Cut the current wait short and run a pass now
    TriggerNow,

    /// Stop after the current pass (or immediately when idle)
    Shutdown,
}

/// State shared with handles, written only by the loop
#[derive(Debug, Default)]
struct SharedState {
    update_count: AtomicU64,
    last_outcome: Mutex<Option<ReconciliationOutcome>>,
}

/// Cloneable, fire-and-forget access to a running scheduler
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::UnboundedSender<SchedulerCommand>,
    state: Arc<SharedState>,
}

impl SchedulerHandle {
    /// Request an immediate pass
    ///
    /// Requests made while a pass is running are served right after it;
    /// several pending requests collapse into one pass.
    pub fn trigger(&self) {
        if self.command_tx.send(SchedulerCommand::TriggerNow).is_err() {
            debug!("Scheduler already stopped, ignoring manual trigger");
        }
    }

    /// Ask the loop to stop
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(SchedulerCommand::Shutdown);
    }

    /// Number of passes that changed the client's listening port
    pub fn update_count(&self) -> u64 {
        self.state.update_count.load(Ordering::SeqCst)
    }

    /// Outcome of the most recent completed pass
    pub fn last_outcome(&self) -> Option<ReconciliationOutcome> {
        self.state
            .last_outcome
            .lock()
            .ok()
            .and_then(|outcome| outcome.clone())
    }
}

enum Wake {
    Elapsed,
    Triggered,
    Shutdown,
}

/// Runs a [`ReconcilePass`] forever on a timer
pub struct Scheduler<P> {
    pass: P,
    command_tx: mpsc::UnboundedSender<SchedulerCommand>,
    command_rx: mpsc::UnboundedReceiver<SchedulerCommand>,
    state: Arc<SharedState>,
    manual_followup: Duration,
}

impl<P: ReconcilePass> Scheduler<P> {
    /// Create a new scheduler around a pass
    pub fn new(pass: P) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            pass,
            command_tx,
            command_rx,
            state: Arc::new(SharedState::default()),
            manual_followup: Duration::from_secs(MANUAL_FOLLOWUP_INTERVAL_SECS),
        }
    }

    /// Get a handle for triggering, stopping and observing the loop
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: Arc::clone(&self.state),
        }
    }

    /// Run passes until shutdown is requested
    ///
    /// The first pass runs immediately. After a manually triggered pass the
    /// next wait is the short follow-up interval, then the configured one.
    pub async fn run(mut self) {
        let mut manual = false;

        loop {
            let report = self.pass.run_pass().await;
            self.record(&report.outcome);

            let wait = if manual {
                self.manual_followup
            } else {
                report.next_interval
            };

            info!(outcome = %report.outcome, updates = self.state.update_count.load(Ordering::SeqCst), "Completed");
            info!("Waiting for: {} seconds", wait.as_secs());

            match self.wait(wait).await {
                Wake::Elapsed => manual = false,
                Wake::Triggered => {
                    info!("Manual trigger received, running pass now");
                    manual = true;
                }
                Wake::Shutdown => {
                    info!("Scheduler shutting down");
                    break;
                }
            }
        }
    }

    fn record(&self, outcome: &ReconciliationOutcome) {
        if outcome.changed_port() {
            self.state.update_count.fetch_add(1, Ordering::SeqCst);
        }
        if let Ok(mut last) = self.state.last_outcome.lock() {
            *last = Some(outcome.clone());
        }
    }

    async fn wait(&mut self, duration: Duration) -> Wake {
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        tokio::select! {
            // Commands queued during the pass win over an already elapsed timer
            biased;

            command = self.command_rx.recv() => match command {
                Some(SchedulerCommand::TriggerNow) => self.coalesce_triggers(),
                Some(SchedulerCommand::Shutdown) | None => Wake::Shutdown,
            },

            _ = &mut sleep => Wake::Elapsed,
        }
    }

    /// Drain queued triggers so a burst of requests costs a single pass
    fn coalesce_triggers(&mut self) -> Wake {
        while let Ok(command) = self.command_rx.try_recv() {
            if command == SchedulerCommand::Shutdown {
                return Wake::Shutdown;
            }
        }
        Wake::Triggered
    }
}
