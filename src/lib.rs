pub mod config;
pub mod db;
pub mod monitoring;
pub mod notifications;
pub mod plans;
pub mod retention;
pub mod version;
