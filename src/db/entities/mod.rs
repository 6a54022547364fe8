//! SeaORM entities for the tables the worker reads and writes.

pub mod alert_channel;
pub mod check_result;
pub mod subscription;
pub mod target;
pub mod user;
