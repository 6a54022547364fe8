//! In-memory collaborators for exercising the scheduler without a database or
//! network.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::clock::Clock;
use super::models::{AccountLimits, CheckResult, Outcome, Status, Target};
use super::prober::Prober;
use super::store::{AccountLimitsProvider, StoreError, TargetStore};
use crate::notifications::senders::SenderError;
use crate::notifications::{NotificationError, Notifier};
use sea_orm::{DbErr, RuntimeErr};

pub fn connection_refused() -> StoreError {
    StoreError::DatabaseError(DbErr::Conn(RuntimeErr::Internal(
        "connection refused".to_string(),
    )))
}

pub fn target(id: i32, interval_seconds: i64, last_checked: Option<DateTime<Utc>>) -> Target {
    Target {
        id,
        account_id: 1,
        name: format!("site-{id}"),
        url: format!("https://site-{id}.example"),
        interval_seconds,
        is_active: true,
        last_checked,
        current_status: Status::Unknown,
        last_up: None,
        last_down: None,
    }
}

pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        }
    }
}

impl FakeClock {
    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    targets: Mutex<HashMap<i32, Target>>,
    checks: Mutex<Vec<CheckResult>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn with_targets(targets: Vec<Target>) -> Self {
        let store = Self::default();
        {
            let mut map = store.targets.lock().unwrap();
            for t in targets {
                map.insert(t.id, t);
            }
        }
        store
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn target(&self, id: i32) -> Target {
        self.targets.lock().unwrap()[&id].clone()
    }

    pub fn check_results(&self) -> Vec<CheckResult> {
        self.checks.lock().unwrap().clone()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(connection_refused())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TargetStore for MemoryStore {
    async fn list_active_targets(&self) -> Result<Vec<Target>, StoreError> {
        self.ensure_available()?;
        let mut targets: Vec<Target> = self
            .targets
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        targets.sort_by_key(|t| t.id);
        Ok(targets)
    }

    async fn get_status(&self, target_id: i32) -> Result<Status, StoreError> {
        self.ensure_available()?;
        self.targets
            .lock()
            .unwrap()
            .get(&target_id)
            .map(|t| t.current_status)
            .ok_or(StoreError::TargetNotFound(target_id))
    }

    async fn update_status(
        &self,
        target_id: i32,
        status: Status,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut targets = self.targets.lock().unwrap();
        let target = targets
            .get_mut(&target_id)
            .ok_or(StoreError::TargetNotFound(target_id))?;
        target.current_status = status;
        target.last_checked = Some(now);
        match status {
            Status::Up => target.last_up = Some(now),
            Status::Down => target.last_down = Some(now),
            Status::Unknown => {}
        }
        Ok(())
    }

    async fn insert_check_result(&self, result: &CheckResult) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.checks.lock().unwrap().push(result.clone());
        Ok(())
    }
}

pub struct StaticLimits {
    default: AccountLimits,
    per_account: Mutex<HashMap<i32, AccountLimits>>,
    failures_left: AtomicUsize,
}

impl Default for StaticLimits {
    fn default() -> Self {
        Self {
            default: AccountLimits {
                max_targets: 5,
                min_interval_seconds: 0,
                history_days: Some(7),
                alerts_enabled: true,
            },
            per_account: Mutex::new(HashMap::new()),
            failures_left: AtomicUsize::new(0),
        }
    }
}

impl StaticLimits {
    pub fn set(&self, account_id: i32, limits: AccountLimits) {
        self.per_account.lock().unwrap().insert(account_id, limits);
    }

    /// The next `count` lookups fail.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountLimitsProvider for StaticLimits {
    async fn limits(&self, account_id: i32) -> Result<AccountLimits, StoreError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(connection_refused());
        }
        Ok(self
            .per_account
            .lock()
            .unwrap()
            .get(&account_id)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

/// Alerts as `(target_id, error_message, occurred_at)`.
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<(i32, Option<String>, DateTime<Utc>)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn fail_next_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn alerts(&self) -> Vec<(i32, Option<String>, DateTime<Utc>)> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_down_alert(
        &self,
        target: &Target,
        error_message: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::SenderError(SenderError::SendFailed(
                "webhook returned 502".to_string(),
            )));
        }
        self.alerts.lock().unwrap().push((
            target.id,
            error_message.map(str::to_string),
            occurred_at,
        ));
        Ok(())
    }
}

/// Answers `up` unless told otherwise for a URL.
#[derive(Default)]
pub struct ScriptedProber {
    responses: Mutex<HashMap<String, Outcome>>,
    hanging: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn respond(&self, url: &str, outcome: Outcome) {
        self.responses.lock().unwrap().insert(url.to_string(), outcome);
    }

    pub fn hang(&self, url: &str) {
        self.hanging.lock().unwrap().insert(url.to_string());
    }

    pub fn panic_on(&self, url: &str) {
        self.panicking.lock().unwrap().insert(url.to_string());
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, url: &str) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panicking.lock().unwrap().contains(url) {
            panic!("prober blew up on {url}");
        }
        let hang = self.hanging.lock().unwrap().contains(url);
        if hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Outcome::up(15, 200))
    }
}
