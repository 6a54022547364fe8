use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-channel settings, stored as JSON in `alert_channels.config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChannelConfig {
    Telegram { bot_token: String, chat_id: String },
    Webhook {
        url: String,
        #[serde(default = "default_webhook_method")]
        method: String, // "GET" or "POST"
        #[serde(default)]
        headers: Option<HashMap<String, String>>,
        /// Tera template for the POST body. Without one the body is a JSON
        /// object with the message and the alert fields.
        #[serde(default)]
        body_template: Option<String>,
    },
}

fn default_webhook_method() -> String {
    "POST".to_string()
}
