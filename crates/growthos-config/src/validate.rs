//! Post-merge configuration validation.

use std::net::SocketAddr;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Accepted values for `logging.format`.
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Accepted values for `logging.target`.
const LOG_TARGETS: &[&str] = &["stderr", "stdout", "file"];

/// Validate a fully merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_server(config)?;
    validate_simulation(config)?;
    validate_revenue(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_server(config: &Config) -> ConfigResult<()> {
    let s = &config.server;

    if s.bind.parse::<SocketAddr>().is_err() {
        return Err(invalid(
            "server.bind",
            format!("'{}' is not a socket address (expected host:port)", s.bind),
        ));
    }
    if !s.ws_path.starts_with('/') {
        return Err(invalid("server.ws_path", "must start with '/'"));
    }
    if s.observer_buffer == 0 {
        return Err(invalid("server.observer_buffer", "must be at least 1"));
    }
    Ok(())
}

fn validate_simulation(config: &Config) -> ConfigResult<()> {
    let t = config.simulation.time_scale;
    if !t.is_finite() || t <= 0.0 {
        return Err(invalid(
            "simulation.time_scale",
            format!("{t} is out of range; must be a positive number"),
        ));
    }
    Ok(())
}

fn validate_revenue(config: &Config) -> ConfigResult<()> {
    let r = &config.revenue;
    for (field, value) in [
        ("revenue.booking_value", r.booking_value),
        ("revenue.upsell_value", r.upsell_value),
        ("revenue.expected_value", r.expected_value),
    ] {
        if value == 0 {
            return Err(invalid(field, "must be greater than zero"));
        }
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;
    let format = l.format.as_str();
    if !LOG_FORMATS.contains(&format) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported format '{format}'; expected one of: {}",
                LOG_FORMATS.join(", ")
            ),
        ));
    }

    let target = l.target.as_str();
    if !LOG_TARGETS.contains(&target) {
        return Err(invalid(
            "logging.target",
            format!(
                "unsupported target '{target}'; expected one of: {}",
                LOG_TARGETS.join(", ")
            ),
        ));
    }
    if target == "file" && l.directory.as_ref().is_none_or(|d| d.as_os_str().is_empty()) {
        return Err(invalid(
            "logging.directory",
            "required when logging.target is \"file\"",
        ));
    }
    Ok(())
}
