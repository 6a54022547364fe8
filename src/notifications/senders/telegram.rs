use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;

use super::{NotificationSender, SenderError, ensure_success, http_client};
use crate::notifications::models::ChannelConfig;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Pushes alerts through the Telegram Bot API.
pub struct TelegramSender {
    client: Client,
    api_base: String,
}

impl TelegramSender {
    pub fn new() -> Result<Self, SenderError> {
        Self::with_api_base(TELEGRAM_API_BASE)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Result<Self, SenderError> {
        Ok(Self {
            client: http_client()?,
            api_base: api_base.into(),
        })
    }
}

/// Escapes text for Telegram MarkdownV2.
/// Characters to escape: _ * [ ] ( ) ~ ` > # + - = | { } . !
fn escape_markdown_v2(text: &str) -> String {
    let mut escaped_text = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{'
                | '}' | '.' | '!' | '\\'
        ) {
            escaped_text.push('\\');
        }
        escaped_text.push(c);
    }
    escaped_text
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(
        &self,
        config: &ChannelConfig,
        message: &str,
        _context: &HashMap<String, String>,
    ) -> Result<(), SenderError> {
        let ChannelConfig::Telegram { bot_token, chat_id } = config else {
            return Err(SenderError::InvalidConfiguration(
                "Expected Telegram config, but found a different type.".to_string(),
            ));
        };

        let api_url = format!("{}/bot{bot_token}/sendMessage", self.api_base);
        let escaped_message = escape_markdown_v2(message);
        let payload = TelegramMessage {
            chat_id,
            text: &escaped_message,
            parse_mode: "MarkdownV2",
        };

        let response = self.client.post(&api_url).json(&payload).send().await?;
        ensure_success(response, "Telegram API").await
    }
}
