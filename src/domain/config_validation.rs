//! Configuration validation.
//!
//! Every key is optional; these checks only reject values that are present
//! and unusable.

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_options_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_model_section(config, "options")?;
    config.get_date("options", "expiration")?;
    Ok(())
}

pub fn validate_equity_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_model_section(config, "equity")?;
    validate_dates(config)?;
    validate_timeout(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// A typed value for `[section] key`. Absent or blank keys are `Ok(None)`.
pub fn parse_key<T: std::str::FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, TraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => s.trim().parse::<T>().map(Some).map_err(|_| {
            invalid(
                section,
                key,
                &format!("cannot parse {:?} as {}", s.trim(), std::any::type_name::<T>()),
            )
        }),
        _ => Ok(None),
    }
}

fn validate_model_section(config: &dyn ConfigPort, section: &str) -> Result<(), TraderError> {
    if let Some(n) = parse_key::<i64>(config, section, "n_estimators")? {
        if n < 1 {
            return Err(invalid(section, "n_estimators", "n_estimators must be at least 1"));
        }
    }
    parse_key::<u64>(config, section, "seed")?;
    parse_key::<u64>(config, section, "split_seed")?;
    if let Some(ratio) = parse_key::<f64>(config, section, "test_ratio")? {
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(invalid(section, "test_ratio", "test_ratio must be between 0 and 1"));
        }
    }
    if let Some(depth) = parse_key::<i64>(config, section, "max_depth")? {
        if depth < 1 {
            return Err(invalid(section, "max_depth", "max_depth must be at least 1"));
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let start = config.get_date("equity", "start_date")?;
    let end = config.get_date("equity", "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "equity",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

fn validate_timeout(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if let Some(secs) = parse_key::<i64>(config, "quantconnect", "timeout_secs")? {
        if secs < 1 {
            return Err(invalid(
                "quantconnect",
                "timeout_secs",
                "timeout_secs must be positive",
            ));
        }
    }
    Ok(())
}
