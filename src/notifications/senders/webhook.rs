use async_trait::async_trait;
use reqwest::{Client, Method, header};
use std::collections::HashMap;
use tera::{Context, Tera};

use super::{NotificationSender, SenderError, ensure_success, http_client};
use crate::notifications::models::ChannelConfig;

/// Pushes alerts to a user-supplied HTTP endpoint.
pub struct WebhookSender {
    client: Client,
}

impl WebhookSender {
    pub fn new() -> Result<Self, SenderError> {
        Ok(Self {
            client: http_client()?,
        })
    }

    fn render_body(
        message: &str,
        context: &HashMap<String, String>,
        body_template: Option<&str>,
    ) -> Result<String, SenderError> {
        match body_template {
            Some(template) => {
                let mut tera_context = Context::new();
                for (key, value) in context {
                    tera_context.insert(key, value);
                }
                tera_context.insert("message", message);
                // Autoescape off: templates produce JSON, not HTML.
                Tera::one_off(template, &tera_context, false)
                    .map_err(|e| SenderError::TemplatingError(e.to_string()))
            }
            None => {
                let mut body: serde_json::Map<String, serde_json::Value> = context
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                body.insert("text".to_string(), serde_json::Value::String(message.to_string()));
                Ok(serde_json::Value::Object(body).to_string())
            }
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn send(
        &self,
        config: &ChannelConfig,
        message: &str,
        context: &HashMap<String, String>,
    ) -> Result<(), SenderError> {
        let ChannelConfig::Webhook {
            url,
            method,
            headers,
            body_template,
        } = config
        else {
            return Err(SenderError::InvalidConfiguration(
                "Expected Webhook config, but found a different type.".to_string(),
            ));
        };

        let http_method = match method.to_uppercase().as_str() {
            "POST" => Method::POST,
            "GET" => Method::GET,
            _ => {
                return Err(SenderError::InvalidConfiguration(format!(
                    "Unsupported HTTP method: {method}"
                )));
            }
        };
        let is_post = http_method == Method::POST;

        let mut request_builder = self.client.request(http_method, url);

        if let Some(h) = headers {
            let mut header_map = header::HeaderMap::new();
            for (key, value) in h {
                let header_name = header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                    SenderError::InvalidConfiguration(format!("Invalid header name: {e}"))
                })?;
                let header_value = header::HeaderValue::from_str(value).map_err(|e| {
                    SenderError::InvalidConfiguration(format!("Invalid header value: {e}"))
                })?;
                header_map.insert(header_name, header_value);
            }
            request_builder = request_builder.headers(header_map);
        }

        if is_post {
            let body = Self::render_body(message, context, body_template.as_deref())?;
            request_builder = request_builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request_builder.send().await?;
        ensure_success(response, "Webhook").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::senders::capture_one_request;

    fn context() -> HashMap<String, String> {
        HashMap::from([
            ("target_name".to_string(), "Shop".to_string()),
            ("url".to_string(), "https://shop.example".to_string()),
            ("error".to_string(), "HTTP 503".to_string()),
        ])
    }

    fn webhook(url: String, body_template: Option<&str>) -> ChannelConfig {
        ChannelConfig::Webhook {
            url,
            method: "POST".to_string(),
            headers: Some(HashMap::from([(
                "X-Api-Key".to_string(),
                "secret".to_string(),
            )])),
            body_template: body_template.map(str::to_string),
        }
    }

    #[test]
    fn test_default_body_is_json_with_text() {
        let body = WebhookSender::render_body("Shop is down", &context(), None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["text"], "Shop is down");
        assert_eq!(value["error"], "HTTP 503");
    }

    #[test]
    fn test_template_body_is_rendered() {
        let body = WebhookSender::render_body(
            "ignored",
            &context(),
            Some(r#"{"site": "{{ target_name }}", "why": "{{ error }}"}"#),
        )
        .unwrap();
        assert_eq!(body, r#"{"site": "Shop", "why": "HTTP 503"}"#);
    }

    #[test]
    fn test_broken_template_is_a_templating_error() {
        let result = WebhookSender::render_body("m", &context(), Some("{{ unclosed"));
        assert!(matches!(result, Err(SenderError::TemplatingError(_))));
    }

    #[tokio::test]
    async fn test_posts_body_and_headers() {
        let (base, request) = capture_one_request("200 OK").await;
        let sender = WebhookSender::new().unwrap();

        sender
            .send(&webhook(format!("{base}/hook"), None), "Shop is down", &context())
            .await
            .unwrap();

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /hook"));
        assert!(raw.to_lowercase().contains("x-api-key: secret"));
        assert!(raw.contains(r#""text":"Shop is down""#));
    }

    #[tokio::test]
    async fn test_non_success_status_is_send_failed() {
        let (base, _request) = capture_one_request("500 Internal Server Error").await;
        let sender = WebhookSender::new().unwrap();

        let result = sender
            .send(&webhook(base, None), "Shop is down", &context())
            .await;

        assert!(matches!(result, Err(SenderError::SendFailed(_))));
    }

    #[tokio::test]
    async fn test_rejects_unknown_method_and_wrong_config() {
        let sender = WebhookSender::new().unwrap();
        let put = ChannelConfig::Webhook {
            url: "http://127.0.0.1:9".to_string(),
            method: "PUT".to_string(),
            headers: None,
            body_template: None,
        };
        assert!(matches!(
            sender.send(&put, "m", &context()).await,
            Err(SenderError::InvalidConfiguration(_))
        ));

        let telegram = ChannelConfig::Telegram {
            bot_token: "t".to_string(),
            chat_id: "c".to_string(),
        };
        assert!(matches!(
            sender.send(&telegram, "m", &context()).await,
            Err(SenderError::InvalidConfiguration(_))
        ));
    }
}
