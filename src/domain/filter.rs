//! List filters and row-level visibility.
//!
//! Sales users only ever see their own projects and BD updates; admins see
//! everything and may narrow by sales user. Every adapter applies the filter
//! after it has been passed through `scoped_to`.

use super::bd_update::BdWeeklyUpdate;
use super::error::SalesTrackError;
use super::profile::{Profile, UserRole};
use super::project::{ProgressType, Project, Prospect};

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: String,
    pub role: UserRole,
}

impl Viewer {
    /// The CLI operator when no user is impersonated.
    pub fn operator() -> Self {
        Self {
            user_id: "operator".to_string(),
            role: UserRole::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&Profile> for Viewer {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.id.clone(),
            role: profile.role,
        }
    }
}

/// BD monitoring lists every sales user's updates and is admin only.
pub fn authorize_monitoring(viewer: &Viewer) -> Result<(), SalesTrackError> {
    if viewer.is_admin() {
        Ok(())
    } else {
        Err(SalesTrackError::Forbidden {
            reason: format!("BD monitoring requires admin role ({})", viewer.user_id),
        })
    }
}

/// A project is open to its owner and to admins.
pub fn authorize_project(viewer: &Viewer, project: &Project) -> Result<(), SalesTrackError> {
    if viewer.is_admin() || project.sales_id == viewer.user_id {
        Ok(())
    } else {
        Err(SalesTrackError::Forbidden {
            reason: format!("project {} belongs to another user", project.id),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub progress_type: Option<ProgressType>,
    pub prospect: Option<Prospect>,
    pub sales_id: Option<String>,
}

impl ProjectFilter {
    /// Builds a filter from query-string style values. Blank values mean
    /// "all"; unknown category spellings are errors.
    pub fn from_params(
        progress_type: Option<&str>,
        prospect: Option<&str>,
        sales_id: Option<&str>,
    ) -> Result<Self, SalesTrackError> {
        Ok(Self {
            progress_type: non_blank(progress_type).map(str::parse).transpose()?,
            prospect: non_blank(prospect).map(str::parse).transpose()?,
            sales_id: non_blank(sales_id).map(str::to_string),
        })
    }

    pub fn scoped_to(mut self, viewer: &Viewer) -> Self {
        if !viewer.is_admin() {
            self.sales_id = Some(viewer.user_id.clone());
        }
        self
    }

    pub fn matches(&self, project: &Project) -> bool {
        if let Some(t) = self.progress_type {
            if project.progress_type != Some(t) {
                return false;
            }
        }
        if let Some(p) = self.prospect {
            if project.prospect != Some(p) {
                return false;
            }
        }
        if let Some(ref sales_id) = self.sales_id {
            if &project.sales_id != sales_id {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BdUpdateFilter {
    pub year: i32,
    pub week_from: Option<u32>,
    pub week_to: Option<u32>,
    pub sales_id: Option<String>,
    pub customer_id: Option<String>,
}

impl BdUpdateFilter {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            week_from: None,
            week_to: None,
            sales_id: None,
            customer_id: None,
        }
    }

    /// Builds a filter from query-string style values. Week bounds take the
    /// leading digits of the input and are ignored when there are none, so
    /// `"12abc"` reads as 12 and `"abc"` as no bound.
    pub fn from_params(
        year: i32,
        week_from: Option<&str>,
        week_to: Option<&str>,
        sales_id: Option<&str>,
        customer_id: Option<&str>,
    ) -> Self {
        Self {
            year,
            week_from: week_from.and_then(leading_number),
            week_to: week_to.and_then(leading_number),
            sales_id: non_blank(sales_id).map(str::to_string),
            customer_id: non_blank(customer_id).map(str::to_string),
        }
    }

    pub fn scoped_to(mut self, viewer: &Viewer) -> Self {
        if !viewer.is_admin() {
            self.sales_id = Some(viewer.user_id.clone());
        }
        self
    }

    /// Restricts to the viewer's own entries regardless of role.
    pub fn own(mut self, viewer: &Viewer) -> Self {
        self.sales_id = Some(viewer.user_id.clone());
        self
    }

    pub fn matches(&self, update: &BdWeeklyUpdate) -> bool {
        if update.year != self.year {
            return false;
        }
        if self.week_from.is_some_and(|from| update.week_number < from) {
            return false;
        }
        if self.week_to.is_some_and(|to| update.week_number > to) {
            return false;
        }
        if let Some(ref sales_id) = self.sales_id {
            if &update.user_id != sales_id {
                return false;
            }
        }
        if let Some(ref customer_id) = self.customer_id {
            if update.customer_id.as_ref() != Some(customer_id) {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn leading_number(value: &str) -> Option<u32> {
    let trimmed = value.trim_start();
    let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
