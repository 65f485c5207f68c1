//! Port traits between the domain and its data sources.

pub mod config_port;
pub mod option_chain_port;
pub mod price_port;
