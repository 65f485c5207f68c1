//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "http")]
pub mod quantconnect_adapter;
#[cfg(feature = "http")]
pub mod yahoo_adapter;
