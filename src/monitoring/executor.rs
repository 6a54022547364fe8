use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use super::models::{Outcome, Target};
use super::prober::Prober;

/// Runs the checks of one tick on a bounded pool of tokio tasks.
///
/// Each check is its own task, so a panic or a hang stays with that target. The
/// per-check deadline is enforced here, independent of whatever timeout the
/// prober applies internally.
pub struct CheckExecutor {
    prober: Arc<dyn Prober>,
    pool_size: usize,
    check_deadline: Duration,
}

impl CheckExecutor {
    pub fn new(prober: Arc<dyn Prober>, pool_size: usize, check_deadline: Duration) -> Self {
        Self {
            prober,
            pool_size: pool_size.max(1),
            check_deadline,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Yields exactly one outcome per due target, in completion order.
    pub async fn execute(&self, due: Vec<Target>) -> Vec<(Target, Outcome)> {
        let deadline = self.check_deadline;
        stream::iter(due.into_iter().map(|target| {
            let prober = Arc::clone(&self.prober);
            async move {
                let outcome = run_check(prober, &target, deadline).await;
                (target, outcome)
            }
        }))
        .buffer_unordered(self.pool_size)
        .collect()
        .await
    }
}

async fn run_check(prober: Arc<dyn Prober>, target: &Target, deadline: Duration) -> Outcome {
    let url = target.url.clone();
    let mut handle = tokio::spawn(async move { prober.probe(&url).await });

    match tokio::time::timeout(deadline, &mut handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => {
            error!(target_id = target.id, url = %target.url, error = %join_error, "Check task failed.");
            Outcome::down(None, None, format!("check failed: {join_error}"))
        }
        Err(_) => {
            handle.abort();
            warn!(
                target_id = target.id,
                url = %target.url,
                deadline_ms = deadline.as_millis() as u64,
                "Check exceeded its deadline."
            );
            Outcome::down(None, None, "timeout")
        }
    }
}
