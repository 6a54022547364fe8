//! The SeaORM-backed implementation of the monitoring store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::sync::Arc;

use super::entities::target;
use super::services;
use crate::monitoring::clock::Clock;
use crate::monitoring::models::{AccountLimits, CheckResult, Status, Target};
use crate::monitoring::store::{AccountLimitsProvider, StoreError, TargetStore};
use crate::plans::limits_for_subscription;
use crate::retention::RetentionStore;

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn parse_status(raw: &str) -> Status {
    raw.parse().unwrap_or(Status::Unknown)
}

impl From<target::Model> for Target {
    fn from(model: target::Model) -> Self {
        Target {
            id: model.id,
            account_id: model.user_id,
            name: model.name,
            url: model.url,
            interval_seconds: i64::from(model.check_interval),
            is_active: model.is_active,
            last_checked: model.last_checked,
            current_status: parse_status(&model.current_status),
            last_up: model.last_up,
            last_down: model.last_down,
        }
    }
}

#[async_trait]
impl TargetStore for SeaOrmStore {
    async fn list_active_targets(&self) -> Result<Vec<Target>, StoreError> {
        let models = services::get_active_targets(&self.db).await?;
        Ok(models.into_iter().map(Target::from).collect())
    }

    async fn get_status(&self, target_id: i32) -> Result<Status, StoreError> {
        services::get_target_by_id(&self.db, target_id)
            .await?
            .map(|model| parse_status(&model.current_status))
            .ok_or(StoreError::TargetNotFound(target_id))
    }

    async fn update_status(
        &self,
        target_id: i32,
        status: Status,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if services::update_target_status(&self.db, target_id, status, now).await? {
            Ok(())
        } else {
            Err(StoreError::TargetNotFound(target_id))
        }
    }

    async fn insert_check_result(&self, result: &CheckResult) -> Result<(), StoreError> {
        services::insert_check_result(&self.db, result).await?;
        Ok(())
    }

    /// Reads the previous status, inserts the check and moves the status in
    /// one transaction. Dropping `txn` on an early return rolls it back.
    async fn record_check(&self, result: &CheckResult) -> Result<Status, StoreError> {
        let txn = self.db.begin().await?;

        let previous = services::get_target_by_id(&txn, result.target_id)
            .await?
            .map(|model| parse_status(&model.current_status))
            .ok_or(StoreError::TargetNotFound(result.target_id))?;
        services::insert_check_result(&txn, result).await?;
        if !services::update_target_status(&txn, result.target_id, result.status, result.checked_at)
            .await?
        {
            return Err(StoreError::TargetNotFound(result.target_id));
        }

        txn.commit().await?;
        Ok(previous)
    }
}

#[async_trait]
impl AccountLimitsProvider for SeaOrmStore {
    async fn limits(&self, account_id: i32) -> Result<AccountLimits, StoreError> {
        let subscription = services::get_subscription_for_user(&self.db, account_id).await?;
        Ok(limits_for_subscription(
            subscription.as_ref(),
            self.clock.now(),
        ))
    }
}

#[async_trait]
impl RetentionStore for SeaOrmStore {
    async fn account_ids(&self) -> Result<Vec<i32>, StoreError> {
        Ok(services::get_user_ids_with_targets(&self.db).await?)
    }

    async fn delete_checks_before(
        &self,
        account_id: i32,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let target_ids = services::get_target_ids_for_user(&self.db, account_id).await?;
        Ok(services::delete_check_results_before(&self.db, &target_ids, cutoff).await?)
    }
}
