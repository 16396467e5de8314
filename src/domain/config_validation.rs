//! Configuration validation.
//!
//! Runs once at startup, before any data source is opened.

use crate::domain::error::SalesTrackError;
use crate::ports::config_port::ConfigPort;

pub const MIN_REPORTING_YEAR: i64 = 1900;
pub const MAX_REPORTING_YEAR: i64 = 9999;

pub const BACKENDS: [&str; 3] = ["csv", "sqlite", "postgres"];

pub fn validate_app_config(config: &dyn ConfigPort) -> Result<(), SalesTrackError> {
    validate_reporting_year(config)?;
    validate_strict_weeks(config)?;
    validate_backend(config)?;
    Ok(())
}

fn validate_reporting_year(config: &dyn ConfigPort) -> Result<(), SalesTrackError> {
    let Some(raw) = config.get_string("reporting", "year") else {
        // Falls back to the current calendar year.
        return Ok(());
    };
    let year: i64 = raw.trim().parse().map_err(|_| SalesTrackError::ConfigInvalid {
        section: "reporting".to_string(),
        key: "year".to_string(),
        reason: format!("year must be an integer, got {raw:?}"),
    })?;
    if !(MIN_REPORTING_YEAR..=MAX_REPORTING_YEAR).contains(&year) {
        return Err(SalesTrackError::ConfigInvalid {
            section: "reporting".to_string(),
            key: "year".to_string(),
            reason: format!(
                "year must be between {MIN_REPORTING_YEAR} and {MAX_REPORTING_YEAR}"
            ),
        });
    }
    Ok(())
}

fn validate_strict_weeks(config: &dyn ConfigPort) -> Result<(), SalesTrackError> {
    match config.get_string("reporting", "strict_weeks") {
        None => Ok(()),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "false" | "no" | "0" => Ok(()),
            _ => Err(SalesTrackError::ConfigInvalid {
                section: "reporting".to_string(),
                key: "strict_weeks".to_string(),
                reason: format!("expected a boolean, got {raw:?}"),
            }),
        },
    }
}

fn validate_backend(config: &dyn ConfigPort) -> Result<(), SalesTrackError> {
    let backend = configured_backend(config);
    match backend.as_str() {
        "csv" => config.require_string("csv", "dir").map(|_| ()),
        "sqlite" => {
            config.require_string("sqlite", "path")?;
            pool_size(config, "sqlite").map(|_| ())
        }
        "postgres" => {
            config.require_string("postgres", "connection_string")?;
            pool_size(config, "postgres").map(|_| ())
        }
        other => Err(SalesTrackError::ConfigInvalid {
            section: "data".to_string(),
            key: "backend".to_string(),
            reason: format!("unknown backend {other:?}, expected one of {BACKENDS:?}"),
        }),
    }
}

pub const DEFAULT_POOL_SIZE: i64 = 4;

/// `[{section}] pool_size` as a connection count: at least 1 and within
/// `u32`.
pub fn pool_size(config: &dyn ConfigPort, section: &str) -> Result<u32, SalesTrackError> {
    let raw = config.get_int(section, "pool_size", DEFAULT_POOL_SIZE);
    u32::try_from(raw)
        .ok()
        .filter(|size| *size >= 1)
        .ok_or_else(|| SalesTrackError::ConfigInvalid {
            section: section.to_string(),
            key: "pool_size".to_string(),
            reason: format!("pool_size must be between 1 and {}, got {raw}", u32::MAX),
        })
}

/// Lowercased `[data] backend`, defaulting to `csv`.
pub fn configured_backend(config: &dyn ConfigPort) -> String {
    config
        .get_string("data", "backend")
        .map(|b| b.trim().to_lowercase())
        .unwrap_or_else(|| "csv".to_string())
}
