//! Flat tables for spreadsheet export.
//!
//! The table shape (sheet name, column headers, cell values) is fixed here;
//! the file format is up to the `ExportPort` implementation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use super::bd_update::BdWeeklyUpdate;
use super::customer::Customer;
use super::error::SalesTrackError;
use super::format::{format_date, format_optional_timestamp, PLACEHOLDER};
use super::profile::SalesDirectory;
use super::project::Project;
use super::week::format_label;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub sheet: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

impl ExportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exports of nothing are refused.
    pub fn ensure_not_empty(&self) -> Result<(), SalesTrackError> {
        if self.is_empty() {
            return Err(SalesTrackError::EmptyExport {
                table: self.sheet.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Projects,
    Customers,
    BdUpdates,
}

impl ExportKind {
    pub fn slug(&self) -> &'static str {
        match self {
            ExportKind::Projects => "projects",
            ExportKind::Customers => "customers",
            ExportKind::BdUpdates => "bd-updates",
        }
    }
}

impl FromStr for ExportKind {
    type Err = SalesTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projects" => Ok(ExportKind::Projects),
            "customers" => Ok(ExportKind::Customers),
            "bd-updates" => Ok(ExportKind::BdUpdates),
            other => Err(SalesTrackError::invalid_record(
                "export kind",
                format!("unknown export {other:?}"),
            )),
        }
    }
}

/// `projects-export-2026-10-19.csv`
pub fn export_file_name(kind: ExportKind, today: NaiveDate, extension: &str) -> String {
    format!(
        "{}-export-{}.{}",
        kind.slug(),
        today.format("%Y-%m-%d"),
        extension
    )
}

const PROJECT_HEADERS: &[&str] = &[
    "No Quote",
    "Project Name",
    "Customer",
    "Value",
    "Progress Type",
    "Prospect",
    "Sales",
    "Date",
];

pub fn project_table(projects: &[Project], directory: &SalesDirectory) -> ExportTable {
    let rows = projects
        .iter()
        .map(|p| {
            vec![
                Cell::text(&p.no_quote),
                Cell::text(&p.project_name),
                Cell::text(p.customer_name.clone().unwrap_or_default()),
                Cell::Number(p.value.unwrap_or(0.0)),
                Cell::text(p.progress_type.map(|t| t.as_str()).unwrap_or_default()),
                Cell::text(p.prospect.map(|t| t.as_str()).unwrap_or_default()),
                Cell::text(directory.name_for(&p.sales_id)),
                Cell::text(format_date(p.created_at.date_naive())),
            ]
        })
        .collect();
    ExportTable {
        sheet: "Projects",
        headers: PROJECT_HEADERS,
        rows,
    }
}

const CUSTOMER_HEADERS: &[&str] = &["Name", "Sector", "Created", "PICs"];

pub fn customer_table(customers: &[Customer]) -> ExportTable {
    let rows = customers
        .iter()
        .map(|c| {
            vec![
                Cell::text(&c.name),
                Cell::text(c.sector.map(|s| s.as_str()).unwrap_or_default()),
                Cell::text(
                    c.created_at
                        .map(|ts| format_date(ts.date_naive()))
                        .unwrap_or_default(),
                ),
                Cell::text(c.pics_summary()),
            ]
        })
        .collect();
    ExportTable {
        sheet: "Customers",
        headers: CUSTOMER_HEADERS,
        rows,
    }
}

const BD_UPDATE_HEADERS: &[&str] = &["Week", "Sales", "Customer", "Update", "Updated At"];

/// Week labels are rendered for `reporting_year`, the year the BD log is
/// kept under.
pub fn bd_update_table(
    updates: &[BdWeeklyUpdate],
    directory: &SalesDirectory,
    reporting_year: i32,
) -> ExportTable {
    let rows = updates
        .iter()
        .map(|u| {
            vec![
                Cell::text(format_label(reporting_year, u.week_number)),
                Cell::text(directory.name_for(&u.user_id)),
                Cell::text(u.customer_name.as_deref().unwrap_or(PLACEHOLDER)),
                Cell::text(u.trimmed_content().unwrap_or_default()),
                Cell::text(format_optional_timestamp(u.submitted_at())),
            ]
        })
        .collect();
    ExportTable {
        sheet: "BD Updates",
        headers: BD_UPDATE_HEADERS,
        rows,
    }
}
