use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::detector::TransitionDetector;
use super::executor::CheckExecutor;
use super::models::{AccountLimits, Status};
use super::selector::select_due;
use super::store::{AccountLimitsProvider, StoreError, TargetStore};

#[derive(Debug, Error)]
pub enum TickError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    /// Due targets beyond this many roll over to the next tick.
    pub max_checks_per_tick: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            max_checks_per_tick: None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub active: usize,
    pub due: usize,
    pub deferred: usize,
    pub checked: usize,
    pub up: usize,
    pub down: usize,
    pub alerts: usize,
}

pub struct MonitorScheduler {
    store: Arc<dyn TargetStore>,
    limits: Arc<dyn AccountLimitsProvider>,
    executor: CheckExecutor,
    detector: TransitionDetector,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

/// Handle to a scheduler running on its own task.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<()>,
    join_handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the loop and waits for the current tick, if any, to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.join_handle.await {
            error!(error = ?e, "Scheduler task ended abnormally.");
        }
    }
}

impl MonitorScheduler {
    pub fn new(
        store: Arc<dyn TargetStore>,
        limits: Arc<dyn AccountLimitsProvider>,
        executor: CheckExecutor,
        detector: TransitionDetector,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            limits,
            executor,
            detector,
            clock,
            config,
        }
    }

    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let join_handle = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle {
            shutdown_tx,
            join_handle,
        }
    }

    /// Ticks until `shutdown_rx` fires or its sender is dropped.
    ///
    /// The signal is only observed between ticks; a tick that has started runs
    /// to completion so no outcome is left unrecorded.
    pub async fn run(self: Arc<Self>, mut shutdown_rx: watch::Receiver<()>) {
        info!(
            tick_interval_seconds = self.config.tick_interval.as_secs(),
            pool_size = self.executor.pool_size(),
            "Monitoring scheduler started."
        );
        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Shutdown signal received, stopping monitoring scheduler.");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match self.run_tick().await {
                Ok(report) => info!(
                    active = report.active,
                    due = report.due,
                    deferred = report.deferred,
                    checked = report.checked,
                    up = report.up,
                    down = report.down,
                    alerts = report.alerts,
                    "Monitoring tick completed."
                ),
                Err(e) => error!(error = %e, "Monitoring tick failed; retrying on next cadence."),
            }
        }
        info!("Monitoring scheduler stopped.");
    }

    /// One select/execute/record cycle.
    pub async fn run_tick(&self) -> Result<TickReport, TickError> {
        let targets = self.store.list_active_targets().await?;
        let now = self.clock.now();
        let mut report = TickReport {
            active: targets.len(),
            ..Default::default()
        };

        // Limits are resolved up front so nothing that can fail runs between
        // committing a status and dispatching its alert.
        let accounts: HashSet<i32> = targets.iter().map(|t| t.account_id).collect();
        let mut limits = HashMap::with_capacity(accounts.len());
        for account_id in accounts {
            limits.insert(account_id, self.limits.limits(account_id).await?);
        }

        let mut due = select_due(targets, now, |account_id| {
            limits
                .get(&account_id)
                .map_or(0, |l: &AccountLimits| l.min_interval_seconds)
        });
        report.due = due.len();
        if let Some(cap) = self.config.max_checks_per_tick {
            if due.len() > cap {
                report.deferred = due.len() - cap;
                due.truncate(cap);
            }
        }
        if due.is_empty() {
            debug!(active = report.active, "No targets due this tick.");
            return Ok(report);
        }

        for (target, outcome) in self.executor.execute(due).await {
            let alerts_enabled = limits
                .get(&target.account_id)
                .is_some_and(|l| l.alerts_enabled);
            match self.detector.record(&target, &outcome, alerts_enabled).await {
                Ok(recorded) => {
                    report.checked += 1;
                    match recorded.transition.current {
                        Status::Up => report.up += 1,
                        _ => report.down += 1,
                    }
                    if recorded.alert_sent {
                        report.alerts += 1;
                    }
                }
                Err(StoreError::TargetNotFound(target_id)) => {
                    warn!(target_id, "Target disappeared during the tick; outcome dropped.");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(report)
    }
}
