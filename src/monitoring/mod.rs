//! The monitoring core: decides which targets are due, probes them on a bounded
//! worker pool, records the outcomes and raises down alerts.
//!
//! Data flows `scheduler -> selector -> executor -> prober -> detector`, with the
//! [`store::TargetStore`] and [`crate::notifications::Notifier`] as the only
//! collaborators that touch the outside world.

pub mod clock;
pub mod detector;
pub mod executor;
pub mod models;
pub mod prober;
pub mod scheduler;
pub mod selector;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, SystemClock};
pub use detector::TransitionDetector;
pub use executor::CheckExecutor;
pub use models::{AccountLimits, CheckResult, Outcome, Status, Target, Transition};
pub use prober::{HttpProber, Prober, quick_check};
pub use scheduler::{MonitorScheduler, SchedulerConfig, SchedulerHandle, TickReport};
pub use store::{AccountLimitsProvider, StoreError, TargetStore};
