//! Data access for the worker, one sub-module per table.
//!
//! Functions take any [`sea_orm::ConnectionTrait`] so they run the same against
//! a pooled connection or inside a transaction. Everything is re-exported here
//! for access as `crate::db::services::*`.

pub mod alert_channel_service;
pub mod check_result_service;
pub mod subscription_service;
pub mod target_service;
pub mod user_service;

pub use alert_channel_service::*;
pub use check_result_service::*;
pub use subscription_service::*;
pub use target_service::*;
pub use user_service::*;
