//! Single outbound HTTP check.
//!
//! A down endpoint is the common case this worker exists to detect, so the prober
//! never returns an error: every failure becomes a `down` [`Outcome`] carrying a
//! short human-readable cause.

use async_trait::async_trait;
use reqwest::{Client, redirect};
use std::time::{Duration, Instant};
use tracing::debug;

use super::models::{Outcome, truncate_error};
use crate::version::default_user_agent;

pub const SCHEDULED_CHECK_TIMEOUT: Duration = Duration::from_secs(30);
pub const QUICK_CHECK_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> Outcome;
}

/// reqwest-backed prober. One instance is shared by every worker of a tick.
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> Outcome {
        let url = normalize_url(url);
        let start_time = Instant::now();
        let result = self.client.get(&url).send().await;
        let response_time_ms = start_time.elapsed().as_millis() as i64;

        let outcome = match result {
            Ok(response) => {
                let code = response.status().as_u16();
                if code == 200 {
                    Outcome::up(response_time_ms, code)
                } else {
                    Outcome::down(Some(response_time_ms), Some(code), format!("HTTP {code}"))
                }
            }
            Err(e) => Outcome::down(Some(response_time_ms), None, describe_error(&e)),
        };

        debug!(
            url = %url,
            status = %outcome.status,
            response_time_ms,
            "Probe finished."
        );
        outcome
    }
}

/// On-demand check with the short timeout. Nothing is persisted.
pub async fn quick_check(url: &str) -> Outcome {
    quick_check_with(url, QUICK_CHECK_TIMEOUT, &default_user_agent()).await
}

pub async fn quick_check_with(url: &str, timeout: Duration, user_agent: &str) -> Outcome {
    match HttpProber::new(timeout, user_agent) {
        Ok(prober) => prober.probe(url).await,
        Err(e) => Outcome::down(Some(0), None, e.to_string()),
    }
}

/// Bare hostnames are checked over https.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timeout".to_string()
    } else if e.is_connect() {
        "connection error".to_string()
    } else {
        truncate_error(&e.to_string())
    }
}
