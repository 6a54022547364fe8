use std::sync::Arc;
use tracing::{error, info, warn};

use super::clock::Clock;
use super::models::{CheckResult, Outcome, Target, Transition};
use super::store::{StoreError, TargetStore};
use crate::notifications::Notifier;

/// Persists outcomes and raises a down alert on every `up -> down` edge.
pub struct TransitionDetector {
    store: Arc<dyn TargetStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    location: String,
}

/// What [`TransitionDetector::record`] did for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub transition: Transition,
    pub alert_sent: bool,
}

impl TransitionDetector {
    pub fn new(
        store: Arc<dyn TargetStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            location: location.into(),
        }
    }

    /// Records one outcome for `target`.
    ///
    /// `alerts_enabled` must be resolved before the call: once the new status
    /// is committed a retry sees `down -> down`, so nothing that can fail may
    /// sit between the commit and the dispatch.
    ///
    /// The previous status is re-read from the store on every call rather than
    /// taken from the tick snapshot, so replaying the same outcome stays quiet.
    /// Store errors propagate; alert delivery errors are logged and swallowed.
    pub async fn record(
        &self,
        target: &Target,
        outcome: &Outcome,
        alerts_enabled: bool,
    ) -> Result<Recorded, StoreError> {
        let now = self.clock.now();
        let check = CheckResult::from_outcome(target.id, outcome, now, &self.location);
        let previous = self.store.record_check(&check).await?;

        let transition = Transition {
            target_id: target.id,
            previous,
            current: outcome.status,
            occurred_at: now,
        };

        if transition.previous != transition.current {
            info!(
                target_id = target.id,
                url = %target.url,
                from = %transition.previous,
                to = %transition.current,
                "Target status changed."
            );
        }

        if !transition.is_outage() {
            return Ok(Recorded {
                transition,
                alert_sent: false,
            });
        }

        if !alerts_enabled {
            info!(
                target_id = target.id,
                account_id = target.account_id,
                "Target went down but alerting is disabled for the account."
            );
            return Ok(Recorded {
                transition,
                alert_sent: false,
            });
        }

        let alert_sent = match self
            .notifier
            .send_down_alert(target, outcome.error_message.as_deref(), now)
            .await
        {
            Ok(()) => {
                warn!(target_id = target.id, url = %target.url, "Down alert dispatched.");
                true
            }
            Err(e) => {
                error!(target_id = target.id, error = %e, "Failed to dispatch down alert.");
                false
            }
        };

        Ok(Recorded {
            transition,
            alert_sent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::models::Status;
    use crate::monitoring::test_support::{FakeClock, MemoryStore, RecordingNotifier, target};

    struct Harness {
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        detector: TransitionDetector,
    }

    fn harness(initial: Status) -> (Harness, Target) {
        let mut t = target(7, 300, None);
        t.current_status = initial;
        let store = Arc::new(MemoryStore::with_targets(vec![t.clone()]));
        let notifier = Arc::new(RecordingNotifier::default());
        let detector = TransitionDetector::new(
            store.clone(),
            notifier.clone(),
            Arc::new(FakeClock::default()),
            "test-probe",
        );
        (
            Harness {
                store,
                notifier,
                detector,
            },
            t,
        )
    }

    fn up() -> Outcome {
        Outcome::up(40, 200)
    }

    fn down() -> Outcome {
        Outcome::down(Some(10), None, "connection error")
    }

    #[tokio::test]
    async fn test_record_persists_check_and_status() {
        let (h, t) = harness(Status::Unknown);

        h.detector.record(&t, &up(), true).await.unwrap();

        let checks = h.store.check_results();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].status, Status::Up);
        assert_eq!(checks[0].status_code, Some(200));
        assert_eq!(checks[0].location, "test-probe");

        let stored = h.store.target(7);
        assert_eq!(stored.current_status, Status::Up);
        assert!(stored.last_checked.is_some());
        assert_eq!(stored.last_up, stored.last_checked);
        assert_eq!(stored.last_down, None);
    }

    #[tokio::test]
    async fn test_up_to_down_alerts_once() {
        let (h, t) = harness(Status::Up);

        let recorded = h.detector.record(&t, &down(), true).await.unwrap();

        assert!(recorded.alert_sent);
        let alerts = h.notifier.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].0, 7);
        assert_eq!(alerts[0].1.as_deref(), Some("connection error"));
        assert_eq!(h.store.target(7).last_down, h.store.target(7).last_checked);
    }

    #[tokio::test]
    async fn test_first_observation_down_does_not_alert() {
        let (h, t) = harness(Status::Unknown);
        h.detector.record(&t, &down(), true).await.unwrap();
        assert!(h.notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_persistent_outage_does_not_repeat_alert() {
        let (h, t) = harness(Status::Up);
        h.detector.record(&t, &down(), true).await.unwrap();
        h.detector.record(&t, &down(), true).await.unwrap();
        h.detector.record(&t, &down(), true).await.unwrap();
        assert_eq!(h.notifier.alerts().len(), 1);
        assert_eq!(h.store.check_results().len(), 3);
    }

    #[tokio::test]
    async fn test_flapping_alerts_on_every_down_edge() {
        let (h, t) = harness(Status::Up);
        for outcome in [down(), up(), down()] {
            h.detector.record(&t, &outcome, true).await.unwrap();
        }
        assert_eq!(h.notifier.alerts().len(), 2);
    }

    #[tokio::test]
    async fn test_replaying_same_outcome_does_not_double_alert() {
        let (h, t) = harness(Status::Up);
        let outcome = down();
        // The snapshot still says `up`; the detector must look at the store.
        h.detector.record(&t, &outcome, true).await.unwrap();
        let second = h.detector.record(&t, &outcome, true).await.unwrap();
        assert_eq!(second.transition.previous, Status::Down);
        assert!(!second.alert_sent);
        assert_eq!(h.notifier.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_recovery_does_not_notify() {
        let (h, t) = harness(Status::Down);
        let recorded = h.detector.record(&t, &up(), true).await.unwrap();
        assert_eq!(recorded.transition.previous, Status::Down);
        assert_eq!(recorded.transition.current, Status::Up);
        assert!(h.notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_alerts_disabled_for_account() {
        let (h, t) = harness(Status::Up);
        let recorded = h.detector.record(&t, &down(), false).await.unwrap();
        assert!(!recorded.alert_sent);
        assert!(h.notifier.alerts().is_empty());
        assert_eq!(h.store.target(7).current_status, Status::Down);
    }

    #[tokio::test]
    async fn test_notifier_failure_keeps_the_record() {
        let (h, t) = harness(Status::Up);
        h.notifier.fail_next_sends(true);

        let recorded = h.detector.record(&t, &down(), true).await.unwrap();

        assert!(!recorded.alert_sent);
        assert_eq!(h.store.check_results().len(), 1);
        assert_eq!(h.store.target(7).current_status, Status::Down);

        // The next outage edge alerts normally.
        h.notifier.fail_next_sends(false);
        h.detector.record(&t, &up(), true).await.unwrap();
        h.detector.record(&t, &down(), true).await.unwrap();
        assert_eq!(h.notifier.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_without_alerting() {
        let (h, t) = harness(Status::Up);
        h.store.set_unavailable(true);
        assert!(h.detector.record(&t, &down(), true).await.is_err());
        assert!(h.notifier.alerts().is_empty());
        assert!(h.store.check_results().is_empty());
    }
}
