//! Collaborator interfaces the scheduler runs against.
//!
//! The scheduler owns no state of its own: it reads a snapshot of targets from a
//! [`TargetStore`], asks an [`AccountLimitsProvider`] for the plan-derived facts it
//! needs, and writes check records and status changes back to the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{AccountLimits, CheckResult, Status, Target};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
    #[error("Target not found: {0}")]
    TargetNotFound(i32),
}

#[async_trait]
pub trait TargetStore: Send + Sync {
    async fn list_active_targets(&self) -> Result<Vec<Target>, StoreError>;

    async fn get_status(&self, target_id: i32) -> Result<Status, StoreError>;

    /// Sets `current_status` and `last_checked`, plus `last_up` or `last_down`
    /// matching the new status.
    async fn update_status(
        &self,
        target_id: i32,
        status: Status,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn insert_check_result(&self, result: &CheckResult) -> Result<(), StoreError>;

    /// Persists one check and returns the status the target had before it.
    ///
    /// Stores that support transactions should override this so the insert and
    /// the status update land together or not at all.
    async fn record_check(&self, result: &CheckResult) -> Result<Status, StoreError> {
        self.insert_check_result(result).await?;
        let previous = self.get_status(result.target_id).await?;
        self.update_status(result.target_id, result.status, result.checked_at)
            .await?;
        Ok(previous)
    }
}

#[async_trait]
pub trait AccountLimitsProvider: Send + Sync {
    async fn limits(&self, account_id: i32) -> Result<AccountLimits, StoreError>;
}
