//! Configuration validation.
//!
//! Validates all simulation fields before a run.

use crate::domain::error::MarketSimError;
use crate::ports::config_port::ConfigPort;

pub const SECTION: &str = "simulation";

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), MarketSimError> {
    validate_symbol(config)?;
    validate_span_weeks(config)?;
    validate_fraction(config, "span_percent")?;
    validate_fraction(config, "limit")?;
    validate_fraction(config, "eject")?;
    validate_initial_balance(config)?;
    validate_fee(config)?;
    Ok(())
}

fn invalid(key: &str, reason: &str) -> MarketSimError {
    MarketSimError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Numeric keys must be present and parse; a silent default would change the run.
pub fn require_double(config: &dyn ConfigPort, key: &str) -> Result<f64, MarketSimError> {
    let raw = config
        .get_string(SECTION, key)
        .ok_or_else(|| MarketSimError::ConfigMissing {
            section: SECTION.to_string(),
            key: key.to_string(),
        })?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| invalid(key, &format!("{key} must be a number")))
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), MarketSimError> {
    match config.get_string(SECTION, "symbol") {
        Some(s) => check_symbol(&s).map(|_| ()),
        None => Err(MarketSimError::ConfigMissing {
            section: SECTION.to_string(),
            key: "symbol".to_string(),
        }),
    }
}

/// Trimmed symbol, or an error when nothing is left to look up.
pub fn check_symbol(raw: &str) -> Result<String, MarketSimError> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(MarketSimError::ConfigMissing {
            section: SECTION.to_string(),
            key: "symbol".to_string(),
        });
    }
    Ok(symbol.to_string())
}

fn validate_span_weeks(config: &dyn ConfigPort) -> Result<(), MarketSimError> {
    let value = require_double(config, "span_weeks")?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("span_weeks", "span_weeks must be positive"));
    }
    Ok(())
}

fn validate_fraction(config: &dyn ConfigPort, key: &str) -> Result<(), MarketSimError> {
    let value = require_double(config, key)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(key, &format!("{key} must be between 0 and 1")));
    }
    Ok(())
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), MarketSimError> {
    let value = require_double(config, "initial_balance")?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("initial_balance", "initial_balance must be positive"));
    }
    Ok(())
}

fn validate_fee(config: &dyn ConfigPort) -> Result<(), MarketSimError> {
    if config.get_string(SECTION, "fee").is_none() {
        return Ok(());
    }
    let value = require_double(config, "fee")?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid("fee", "fee must be a non-negative amount"));
    }
    Ok(())
}
