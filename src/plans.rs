//! Subscription plans and the per-account limits derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::entities::subscription;
use crate::monitoring::models::AccountLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
    Business,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Business => "business",
            PlanTier::Enterprise => "enterprise",
        }
    }

    /// Limits a fresh subscription on this tier starts with.
    pub fn default_limits(&self) -> AccountLimits {
        let (max_targets, min_interval_seconds, history_days) = match self {
            PlanTier::Free => (5, 1800, Some(7)),
            PlanTier::Pro => (50, 300, Some(90)),
            PlanTier::Business => (200, 60, Some(365)),
            PlanTier::Enterprise => (1000, 30, None),
        };
        AccountLimits {
            max_targets,
            min_interval_seconds,
            history_days,
            alerts_enabled: true,
        }
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "pro" => Ok(PlanTier::Pro),
            "business" => Ok(PlanTier::Business),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(format!("Unknown plan tier: {other}")),
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the limits that apply to an account right now.
///
/// Missing, inactive and lapsed subscriptions all fall back to the free tier.
/// Enterprise accounts, and any row with a non-positive `history_days`, keep
/// their history forever.
pub fn limits_for_subscription(
    subscription: Option<&subscription::Model>,
    now: DateTime<Utc>,
) -> AccountLimits {
    let Some(sub) = subscription else {
        return PlanTier::Free.default_limits();
    };
    let lapsed = sub.expires_at.is_some_and(|expires_at| expires_at <= now);
    if sub.status != "active" || lapsed {
        return PlanTier::Free.default_limits();
    }

    let tier = sub.plan.parse::<PlanTier>().unwrap_or(PlanTier::Free);
    let history_days = if tier == PlanTier::Enterprise || sub.history_days <= 0 {
        None
    } else {
        Some(i64::from(sub.history_days))
    };

    AccountLimits {
        max_targets: sub.max_websites,
        min_interval_seconds: i64::from(sub.min_check_interval),
        history_days,
        alerts_enabled: sub.email_alerts || sub.sms_alerts,
    }
}
