//! Sales projects and their categorical attributes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::error::SalesTrackError;

/// Project stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressType {
    Budgetary,
    Tender,
    Win,
    Lose,
}

impl ProgressType {
    pub const ALL: [ProgressType; 4] = [
        ProgressType::Budgetary,
        ProgressType::Tender,
        ProgressType::Win,
        ProgressType::Lose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressType::Budgetary => "Budgetary",
            ProgressType::Tender => "Tender",
            ProgressType::Win => "Win",
            ProgressType::Lose => "Lose",
        }
    }

    /// Exact match against a stored spelling. Padded or re-cased values are
    /// not recognised.
    pub fn from_stored(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

impl fmt::Display for ProgressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressType {
    type Err = SalesTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| {
                SalesTrackError::invalid_record("progress_type", format!("unknown value {s:?}"))
            })
    }
}

/// Lead temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prospect {
    HotProspect,
    Normal,
}

impl Prospect {
    pub const ALL: [Prospect; 2] = [Prospect::HotProspect, Prospect::Normal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Prospect::HotProspect => "Hot Prospect",
            Prospect::Normal => "Normal",
        }
    }

    /// Exact match against a stored spelling.
    pub fn from_stored(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == raw)
    }
}

impl fmt::Display for Prospect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prospect {
    type Err = SalesTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| {
                SalesTrackError::invalid_record("prospect", format!("unknown value {s:?}"))
            })
    }
}

/// The slice of a project the metrics aggregation looks at.
///
/// `None` in a categorical field means the stored value was missing or not
/// one of the known spellings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProjectRecord {
    pub value: Option<f64>,
    pub progress_type: Option<ProgressType>,
    pub prospect: Option<Prospect>,
}

impl ProjectRecord {
    /// Builds a record from loosely typed stored values. Anything other than
    /// an exact known spelling becomes `None`.
    pub fn from_raw(value: Option<f64>, progress_type: &str, prospect: &str) -> Self {
        Self {
            value,
            progress_type: ProgressType::from_stored(progress_type),
            prospect: Prospect::from_stored(prospect),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub no_quote: String,
    pub project_name: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub value: Option<f64>,
    pub progress_type: Option<ProgressType>,
    pub prospect: Option<Prospect>,
    pub weekly_update: Option<String>,
    pub sales_id: String,
}

impl Project {
    pub fn record(&self) -> ProjectRecord {
        ProjectRecord {
            value: self.value,
            progress_type: self.progress_type,
            prospect: self.prospect,
        }
    }
}

/// Newest first, the order project lists are shown in.
pub fn sort_newest_first(projects: &mut [Project]) {
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Insert payload for a new project.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub no_quote: String,
    pub project_name: String,
    pub customer_id: String,
    pub value: f64,
    pub progress_type: ProgressType,
    pub prospect: Prospect,
    pub weekly_update: Option<String>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), SalesTrackError> {
        if self.no_quote.trim().is_empty() {
            return Err(SalesTrackError::invalid_record("project", "no_quote is required"));
        }
        if self.project_name.trim().is_empty() {
            return Err(SalesTrackError::invalid_record(
                "project",
                "project_name is required",
            ));
        }
        if self.customer_id.trim().is_empty() {
            return Err(SalesTrackError::invalid_record(
                "project",
                "customer_id is required",
            ));
        }
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(SalesTrackError::invalid_record(
                "project",
                format!("value must be a non-negative number, got {}", self.value),
            ));
        }
        Ok(())
    }
}
