//! Process-wide settings resolved once at startup.

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};

use super::config_validation::{configured_backend, pool_size, validate_app_config};
use super::error::SalesTrackError;
use super::week::WeekSpec;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Csv { dir: PathBuf },
    Sqlite { path: String, pool_size: u32 },
    Postgres { connection_string: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Year the BD log is kept under.
    pub reporting_year: i32,
    /// Reject week numbers beyond the ISO year instead of extrapolating.
    pub strict_weeks: bool,
    pub backend: Backend,
    pub export_dir: PathBuf,
}

impl Settings {
    /// Validates and resolves the configuration. `today` supplies the
    /// reporting year when `[reporting] year` is absent.
    pub fn from_config(config: &dyn ConfigPort, today: NaiveDate) -> Result<Self, SalesTrackError> {
        validate_app_config(config)?;

        let raw_year = config.get_int("reporting", "year", i64::from(today.year()));
        let reporting_year =
            i32::try_from(raw_year).map_err(|_| SalesTrackError::ConfigInvalid {
                section: "reporting".to_string(),
                key: "year".to_string(),
                reason: format!("year {raw_year} is out of range"),
            })?;
        let strict_weeks = config.get_bool("reporting", "strict_weeks", true);

        let backend = match configured_backend(config).as_str() {
            "sqlite" => Backend::Sqlite {
                path: config.require_string("sqlite", "path")?,
                pool_size: pool_size(config, "sqlite")?,
            },
            "postgres" => Backend::Postgres {
                connection_string: config.require_string("postgres", "connection_string")?,
            },
            _ => Backend::Csv {
                dir: PathBuf::from(config.require_string("csv", "dir")?),
            },
        };

        let export_dir = config
            .get_string("export", "dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            reporting_year,
            strict_weeks,
            backend,
            export_dir,
        })
    }

    /// Week `week` of the reporting year, range-checked when `strict_weeks`.
    pub fn reporting_week(&self, week: u32) -> Result<WeekSpec, SalesTrackError> {
        self.week_in(self.reporting_year, week)
    }

    pub fn week_in(&self, year: i32, week: u32) -> Result<WeekSpec, SalesTrackError> {
        if self.strict_weeks {
            WeekSpec::new(year, week)
        } else {
            Ok(WeekSpec::unchecked(year, week))
        }
    }
}
