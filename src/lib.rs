//! options-trader: fetch option chains and daily equity bars, build feature
//! tables, and train a random forest regressor against a price target.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
