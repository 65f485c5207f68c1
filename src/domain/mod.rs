//! Core domain types and logic.

pub mod quote;
pub mod features;
pub mod ohlcv;
pub mod forest;
pub mod model;
pub mod split;
pub mod metrics;
pub mod training;
pub mod credentials;
pub mod run_config;
pub mod config_validation;
pub mod error;
