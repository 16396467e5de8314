//! CSV directory data adapter.
//!
//! Reads one file per table from a directory. A missing file reads as an
//! empty table; a missing directory is an error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::bd_update::{sort_by_week_desc, BdWeeklyUpdate};
use crate::domain::customer::{attach_pics, Customer, CustomerPic, Sector};
use crate::domain::error::SalesTrackError;
use crate::domain::filter::{BdUpdateFilter, ProjectFilter};
use crate::domain::format::parse_timestamp;
use crate::domain::profile::Profile;
use crate::domain::project::{sort_newest_first, ProgressType, Project, Prospect};
use crate::domain::project_update::{sort_history, ProjectUpdate};
use crate::domain::week::WeekSpec;
use crate::ports::data_port::DataPort;

pub const PROFILES_FILE: &str = "profiles.csv";
pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const CUSTOMER_PICS_FILE: &str = "customer_pics.csv";
pub const PROJECTS_FILE: &str = "projects.csv";
pub const BD_UPDATES_FILE: &str = "bd_weekly_updates.csv";
pub const PROJECT_UPDATES_FILE: &str = "project_updates.csv";

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    role: String,
}

#[derive(Debug, Deserialize)]
struct CustomerRow {
    id: String,
    name: String,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

/// Column names follow the hosted `customer_pics` table.
#[derive(Debug, Deserialize)]
struct CustomerPicRow {
    id: String,
    customer_id: String,
    #[serde(default, rename = "nama")]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, rename = "no_hp")]
    phone: Option<String>,
    #[serde(default, rename = "jabatan")]
    position: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectRow {
    id: String,
    created_at: String,
    no_quote: String,
    project_name: String,
    customer_id: String,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    progress_type: Option<String>,
    #[serde(default)]
    prospect: Option<String>,
    #[serde(default)]
    weekly_update: Option<String>,
    sales_id: String,
}

#[derive(Debug, Deserialize)]
struct BdUpdateRow {
    id: String,
    user_id: String,
    year: i32,
    week_number: u32,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectUpdateRow {
    id: String,
    project_id: String,
    content: String,
    created_at: String,
    #[serde(default)]
    created_by: Option<String>,
}

pub struct CsvAdapter {
    base_path: PathBuf,
    strict_weeks: bool,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            strict_weeks: true,
        }
    }

    /// When off, BD update rows with week numbers past the end of their
    /// year are loaded as-is.
    pub fn with_strict_weeks(mut self, strict_weeks: bool) -> Self {
        self.strict_weeks = strict_weeks;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn read_rows<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, SalesTrackError> {
        if !self.base_path.is_dir() {
            return Err(SalesTrackError::Database {
                reason: format!("data directory {} not found", self.base_path.display()),
            });
        }
        let path = self.base_path.join(file);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "table file missing, treating as empty");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| SalesTrackError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        // Headers are trimmed, values are kept verbatim.
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(content.as_bytes());
        let mut rows = Vec::new();
        for (index, result) in rdr.deserialize().enumerate() {
            // Line 1 is the header.
            let row: T = result.map_err(|e| {
                SalesTrackError::invalid_record(file, format!("line {}: {}", index + 2, e))
            })?;
            rows.push(row);
        }
        tracing::debug!(file, rows = rows.len(), "loaded table");
        Ok(rows)
    }

    pub fn profiles(&self) -> Result<Vec<Profile>, SalesTrackError> {
        self.read_rows::<ProfileRow>(PROFILES_FILE)?
            .into_iter()
            .map(|row| {
                Ok(Profile {
                    role: row.role.parse()?,
                    id: row.id,
                    email: non_blank(row.email),
                    full_name: non_blank(row.full_name),
                    display_name: non_blank(row.display_name),
                })
            })
            .collect()
    }

    pub fn customers(&self) -> Result<Vec<Customer>, SalesTrackError> {
        let mut customers = self
            .read_rows::<CustomerRow>(CUSTOMERS_FILE)?
            .into_iter()
            .map(|row| {
                Ok(Customer {
                    created_at: optional_timestamp(CUSTOMERS_FILE, "created_at", row.created_at)?,
                    // Unknown sectors are kept as "no sector".
                    sector: row.sector.as_deref().and_then(Sector::from_stored),
                    id: row.id,
                    name: row.name,
                    pics: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>, SalesTrackError>>()?;

        let pics = self
            .read_rows::<CustomerPicRow>(CUSTOMER_PICS_FILE)?
            .into_iter()
            .map(|row| CustomerPic {
                id: row.id,
                customer_id: row.customer_id,
                name: non_blank(row.name),
                email: non_blank(row.email),
                phone: non_blank(row.phone),
                position: non_blank(row.position),
            })
            .collect();

        attach_pics(&mut customers, pics);
        customers.sort_by_key(|c| c.name.to_lowercase());
        Ok(customers)
    }

    fn customer_names(&self) -> Result<HashMap<String, String>, SalesTrackError> {
        Ok(self
            .read_rows::<CustomerRow>(CUSTOMERS_FILE)?
            .into_iter()
            .map(|row| (row.id, row.name))
            .collect())
    }

    /// Every project, newest first.
    pub fn projects(&self) -> Result<Vec<Project>, SalesTrackError> {
        let names = self.customer_names()?;
        let mut projects = self
            .read_rows::<ProjectRow>(PROJECTS_FILE)?
            .into_iter()
            .map(|row| {
                let created_at = parse_timestamp(&row.created_at).ok_or_else(|| {
                    SalesTrackError::invalid_record(
                        PROJECTS_FILE,
                        format!("project {}: bad created_at {:?}", row.id, row.created_at),
                    )
                })?;
                Ok(Project {
                    customer_name: names.get(&row.customer_id).cloned(),
                    progress_type: row.progress_type.as_deref().and_then(ProgressType::from_stored),
                    prospect: row.prospect.as_deref().and_then(Prospect::from_stored),
                    weekly_update: non_blank(row.weekly_update),
                    id: row.id,
                    created_at,
                    no_quote: row.no_quote,
                    project_name: row.project_name,
                    customer_id: row.customer_id,
                    value: row.value,
                    sales_id: row.sales_id,
                })
            })
            .collect::<Result<Vec<_>, SalesTrackError>>()?;
        sort_newest_first(&mut projects);
        Ok(projects)
    }

    /// Every BD update across all years, highest week first.
    pub fn bd_updates(&self) -> Result<Vec<BdWeeklyUpdate>, SalesTrackError> {
        let names = self.customer_names()?;
        let mut updates = self
            .read_rows::<BdUpdateRow>(BD_UPDATES_FILE)?
            .into_iter()
            .map(|row| {
                if self.strict_weeks {
                    WeekSpec::new(row.year, row.week_number).inspect_err(|e| {
                        tracing::warn!(id = %row.id, error = %e, "rejecting BD update row");
                    })?;
                }
                let customer_id = non_blank(row.customer_id);
                Ok(BdWeeklyUpdate {
                    customer_name: customer_id.as_ref().and_then(|id| names.get(id).cloned()),
                    created_at: optional_timestamp(BD_UPDATES_FILE, "created_at", row.created_at)?,
                    updated_at: optional_timestamp(BD_UPDATES_FILE, "updated_at", row.updated_at)?,
                    id: row.id,
                    user_id: row.user_id,
                    year: row.year,
                    week_number: row.week_number,
                    customer_id,
                    content: non_blank(row.content),
                })
            })
            .collect::<Result<Vec<_>, SalesTrackError>>()?;
        sort_by_week_desc(&mut updates);
        Ok(updates)
    }

    /// Every project history note, newest first.
    pub fn project_updates(&self) -> Result<Vec<ProjectUpdate>, SalesTrackError> {
        let mut updates = self
            .read_rows::<ProjectUpdateRow>(PROJECT_UPDATES_FILE)?
            .into_iter()
            .map(|row| {
                let created_at = parse_timestamp(&row.created_at).ok_or_else(|| {
                    SalesTrackError::invalid_record(
                        PROJECT_UPDATES_FILE,
                        format!("update {}: bad created_at {:?}", row.id, row.created_at),
                    )
                })?;
                Ok(ProjectUpdate {
                    id: row.id,
                    project_id: row.project_id,
                    content: row.content,
                    created_at,
                    created_by: non_blank(row.created_by),
                })
            })
            .collect::<Result<Vec<_>, SalesTrackError>>()?;
        sort_history(&mut updates);
        Ok(updates)
    }
}

impl DataPort for CsvAdapter {
    fn list_profiles(&self) -> Result<Vec<Profile>, SalesTrackError> {
        self.profiles()
    }

    fn list_customers(&self) -> Result<Vec<Customer>, SalesTrackError> {
        self.customers()
    }

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, SalesTrackError> {
        let mut projects = self.projects()?;
        projects.retain(|p| filter.matches(p));
        Ok(projects)
    }

    fn list_bd_updates(
        &self,
        filter: &BdUpdateFilter,
    ) -> Result<Vec<BdWeeklyUpdate>, SalesTrackError> {
        let mut updates = self.bd_updates()?;
        updates.retain(|u| filter.matches(u));
        Ok(updates)
    }

    fn list_project_updates(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectUpdate>, SalesTrackError> {
        let mut updates = self.project_updates()?;
        updates.retain(|u| u.project_id == project_id);
        Ok(updates)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn optional_timestamp(
    file: &str,
    column: &str,
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>, SalesTrackError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw).map(Some).ok_or_else(|| {
            SalesTrackError::invalid_record(file, format!("bad {column} {raw:?}"))
        }),
    }
}
