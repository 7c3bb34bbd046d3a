//! Campaign planning backend: audience reach and inventory estimation,
//! plus feedback-driven recommendation weight learning.

pub mod config;
pub mod core;
pub mod db;
pub mod inventory;
pub mod jobs;
pub mod learning;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod reach;
pub mod services;
pub mod store;
