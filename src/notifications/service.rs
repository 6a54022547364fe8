use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use std::collections::HashMap;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::{info, warn};

use super::Notifier;
use super::models::ChannelConfig;
use super::senders::{
    NotificationSender, SenderError, telegram::TelegramSender, webhook::WebhookSender,
};
use crate::db::entities::alert_channel;
use crate::db::services;
use crate::monitoring::models::Target;

/// Plain-text down alert. Rendered with the alert fields as context.
pub const DEFAULT_DOWN_ALERT_TEMPLATE: &str = "Website Down Alert: {{ target_name }}\n\
Your website {{ target_name }} is currently down.\n\
URL: {{ url }}\n\
Error: {{ error }}\n\
Time: {{ occurred_at }}";

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Unsupported channel type: {0}")]
    UnsupportedChannel(String),
    #[error("Sender error: {0}")]
    SenderError(#[from] SenderError),
    #[error("Template error: {0}")]
    TemplateError(String),
}

/// Fields available to alert templates.
pub fn down_alert_context(
    target: &Target,
    error_message: Option<&str>,
    occurred_at: DateTime<Utc>,
) -> HashMap<String, String> {
    HashMap::from([
        ("target_id".to_string(), target.id.to_string()),
        ("target_name".to_string(), target.name.clone()),
        ("url".to_string(), target.url.clone()),
        (
            "error".to_string(),
            error_message.unwrap_or("unknown error").to_string(),
        ),
        (
            "occurred_at".to_string(),
            occurred_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
    ])
}

pub fn render_down_alert(
    template: &str,
    context: &HashMap<String, String>,
) -> Result<String, NotificationError> {
    let mut tera_context = Context::new();
    for (key, value) in context {
        tera_context.insert(key, value);
    }
    Tera::one_off(template, &tera_context, false)
        .map_err(|e| NotificationError::TemplateError(e.to_string()))
}

/// Delivers down alerts to every enabled channel of the target's account.
pub struct NotificationService {
    db: DatabaseConnection,
    template: String,
    telegram: TelegramSender,
    webhook: WebhookSender,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection) -> Result<Self, NotificationError> {
        Ok(Self {
            db,
            template: DEFAULT_DOWN_ALERT_TEMPLATE.to_string(),
            telegram: TelegramSender::new()?,
            webhook: WebhookSender::new()?,
        })
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_telegram_sender(mut self, telegram: TelegramSender) -> Self {
        self.telegram = telegram;
        self
    }

    async fn dispatch(
        &self,
        channel: &alert_channel::Model,
        message: &str,
        context: &HashMap<String, String>,
    ) -> Result<(), NotificationError> {
        let sender: &dyn NotificationSender = match channel.channel_type.as_str() {
            "telegram" => &self.telegram,
            "webhook" => &self.webhook,
            // email and sms have no transport in the worker.
            other => return Err(NotificationError::UnsupportedChannel(other.to_string())),
        };
        let config: ChannelConfig = serde_json::from_value(channel.config.clone())?;
        sender.send(&config, message, context).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for NotificationService {
    /// Tries every channel even when one fails and returns the last failure.
    async fn send_down_alert(
        &self,
        target: &Target,
        error_message: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), NotificationError> {
        let channels = services::get_enabled_channels_for_user(&self.db, target.account_id).await?;
        if channels.is_empty() {
            info!(
                target_id = target.id,
                account_id = target.account_id,
                "No alert channels configured, skipping down alert."
            );
            return Ok(());
        }

        let context = down_alert_context(target, error_message, occurred_at);
        let message = render_down_alert(&self.template, &context)?;

        let mut last_error = None;
        for channel in &channels {
            match self.dispatch(channel, &message, &context).await {
                Ok(()) => info!(
                    target_id = target.id,
                    channel_id = channel.id,
                    channel_type = %channel.channel_type,
                    "Down alert delivered."
                ),
                Err(e) => {
                    warn!(
                        target_id = target.id,
                        channel_id = channel.id,
                        channel_type = %channel.channel_type,
                        error = %e,
                        "Down alert delivery failed."
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
