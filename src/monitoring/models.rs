use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Availability of a target as last observed by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Unknown,
    Up,
    Down,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Up => "up",
            Status::Down => "down",
        }
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Status::Unknown),
            "up" => Ok(Status::Up),
            "down" => Ok(Status::Down),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored endpoint, as read from the target store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub url: String,
    pub interval_seconds: i64,
    pub is_active: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub current_status: Status,
    pub last_up: Option<DateTime<Utc>>,
    pub last_down: Option<DateTime<Utc>>,
}

/// The immediate result of one probe attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: Status,
    /// `None` only when the executor had to synthesize the outcome because the
    /// probe itself never returned.
    pub response_time_ms: Option<i64>,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
}

impl Outcome {
    pub fn up(response_time_ms: i64, status_code: u16) -> Self {
        Self {
            status: Status::Up,
            response_time_ms: Some(response_time_ms),
            status_code: Some(status_code),
            error_message: None,
        }
    }

    pub fn down(
        response_time_ms: Option<i64>,
        status_code: Option<u16>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            status: Status::Down,
            response_time_ms,
            status_code,
            error_message: Some(truncate_error(&error_message.into())),
        }
    }
}

/// Persisted record of one executed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub target_id: i32,
    pub checked_at: DateTime<Utc>,
    pub status: Status,
    pub response_time_ms: Option<i64>,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub location: String,
}

impl CheckResult {
    pub fn from_outcome(
        target_id: i32,
        outcome: &Outcome,
        checked_at: DateTime<Utc>,
        location: &str,
    ) -> Self {
        Self {
            target_id,
            checked_at,
            status: outcome.status,
            response_time_ms: outcome.response_time_ms,
            status_code: outcome.status_code,
            error_message: outcome.error_message.clone(),
            location: location.to_string(),
        }
    }
}

/// Plan-derived limits of an account. Read-only to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLimits {
    pub max_targets: i32,
    pub min_interval_seconds: i64,
    /// `None` keeps history forever.
    pub history_days: Option<i64>,
    pub alerts_enabled: bool,
}

/// Status change between two consecutive checks of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target_id: i32,
    pub previous: Status,
    pub current: Status,
    pub occurred_at: DateTime<Utc>,
}

impl Transition {
    /// Only an established `up` going `down` is worth waking someone up for.
    pub fn is_outage(&self) -> bool {
        self.previous == Status::Up && self.current == Status::Down
    }
}

pub const MAX_ERROR_MESSAGE_CHARS: usize = 255;

pub fn truncate_error(message: &str) -> String {
    message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [Status::Unknown, Status::Up, Status::Down] {
            assert_eq!(status.as_str().parse::<Status>(), Ok(status));
        }
        assert!("UP".parse::<Status>().is_err());
    }

    #[test]
    fn test_down_outcome_truncates_long_errors() {
        let outcome = Outcome::down(Some(12), None, "x".repeat(1000));
        assert_eq!(outcome.error_message.unwrap().chars().count(), 255);
    }

    #[test]
    fn test_only_up_to_down_is_an_outage() {
        let make = |previous, current| Transition {
            target_id: 1,
            previous,
            current,
            occurred_at: Utc::now(),
        };
        assert!(make(Status::Up, Status::Down).is_outage());
        assert!(!make(Status::Down, Status::Down).is_outage());
        assert!(!make(Status::Unknown, Status::Down).is_outage());
        assert!(!make(Status::Down, Status::Up).is_outage());
    }
}
