//! Down-alert delivery to an account's configured channels.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::monitoring::models::Target;

pub mod models;
pub mod senders;
pub mod service;

pub use service::{NotificationError, NotificationService};

/// Sends the alert raised when a target goes from up to down.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_down_alert(
        &self,
        target: &Target,
        error_message: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), NotificationError>;
}
