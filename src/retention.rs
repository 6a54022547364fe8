//! Deletes check history older than each account's plan allows.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::monitoring::clock::Clock;
use crate::monitoring::models::AccountLimits;
use crate::monitoring::store::{AccountLimitsProvider, StoreError};

/// How far back history is kept. `None` keeps it forever.
pub fn retention_horizon(limits: &AccountLimits) -> Option<ChronoDuration> {
    limits.history_days.map(ChronoDuration::days)
}

#[async_trait]
pub trait RetentionStore: Send + Sync {
    /// Accounts that own at least one target.
    async fn account_ids(&self) -> Result<Vec<i32>, StoreError>;

    /// Deletes the account's check results recorded strictly before `cutoff`.
    async fn delete_checks_before(
        &self,
        account_id: i32,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub accounts: usize,
    pub kept_forever: usize,
    pub failed: usize,
    pub deleted: u64,
}

pub struct RetentionSweeper {
    store: Arc<dyn RetentionStore>,
    limits: Arc<dyn AccountLimitsProvider>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(
        store: Arc<dyn RetentionStore>,
        limits: Arc<dyn AccountLimitsProvider>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            limits,
            clock,
            interval,
        }
    }

    /// One pass over every account. A failing account is logged and skipped.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let account_ids = self.store.account_ids().await?;
        let now = self.clock.now();
        let mut report = SweepReport {
            accounts: account_ids.len(),
            ..Default::default()
        };

        for account_id in account_ids {
            let limits = match self.limits.limits(account_id).await {
                Ok(limits) => limits,
                Err(e) => {
                    error!(account_id, error = %e, "Failed to load limits for retention.");
                    report.failed += 1;
                    continue;
                }
            };
            let Some(horizon) = retention_horizon(&limits) else {
                report.kept_forever += 1;
                continue;
            };
            match self.store.delete_checks_before(account_id, now - horizon).await {
                Ok(deleted) => {
                    if deleted > 0 {
                        debug!(account_id, deleted, "Pruned old check results.");
                    }
                    report.deleted += deleted;
                }
                Err(e) => {
                    error!(account_id, error = %e, "Failed to prune check results.");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    pub async fn run(self: Arc<Self>, mut shutdown_rx: watch::Receiver<()>) {
        info!(
            interval_seconds = self.interval.as_secs(),
            "Retention sweeper started."
        );
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Shutdown signal received, stopping retention sweeper.");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match self.sweep().await {
                Ok(report) => info!(
                    accounts = report.accounts,
                    deleted = report.deleted,
                    failed = report.failed,
                    "Retention sweep completed."
                ),
                Err(e) => error!(error = %e, "Retention sweep failed."),
            }
        }
    }
}
