//! Environment-driven service configuration.
//!
//! Engine heuristics live in their own config structs (`ReachConfig`,
//! `InventoryConfig`, `LearningConfig`, `StoreConfig`); this module only reads
//! process-level settings from the environment.

use std::env;
use std::path::PathBuf;

/// How learning runs are dispatched after a feedback submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Single-writer task inside the API process
    InProcess,
    /// Apalis job pushed to Redis and consumed by the worker binary
    Redis,
}

pub fn get_environment() -> String {
    env::var("APP_ENV")
        .or_else(|_| env::var("ENVIRONMENT"))
        .unwrap_or_else(|_| "sandbox".to_string())
        .to_lowercase()
}

/// `LOG_FORMAT` override (json, pretty or compact)
pub fn get_log_format() -> Option<String> {
    non_empty_var("LOG_FORMAT")
}

pub fn get_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
}

pub fn get_redis_url() -> String {
    env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string())
}

/// PostgreSQL connection string; the file store is used when unset
pub fn get_database_url() -> Option<String> {
    non_empty_var("DATABASE_URL")
}

/// Base URL of the backend serving audience, inventory, format and site tables
pub fn get_reference_data_url() -> Option<String> {
    non_empty_var("REFERENCE_DATA_URL")
}

pub fn get_data_dir() -> PathBuf {
    env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

/// Interval for scheduled learning runs (0 = disabled)
pub fn get_learning_interval_seconds() -> u64 {
    env::var("LEARNING_INTERVAL_SECONDS")
        .ok()
        .and_then(|i| i.parse().ok())
        .unwrap_or(0)
}

pub fn get_dispatch_mode() -> DispatchMode {
    match env::var("LEARNING_DISPATCH")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "redis" | "worker" => DispatchMode::Redis,
        _ => DispatchMode::InProcess,
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
