//! Data access port trait.

use crate::domain::bd_update::BdWeeklyUpdate;
use crate::domain::customer::Customer;
use crate::domain::error::SalesTrackError;
use crate::domain::filter::{BdUpdateFilter, ProjectFilter};
use crate::domain::profile::Profile;
use crate::domain::project::Project;
use crate::domain::project_update::ProjectUpdate;

/// Read access to the sales-tracking tables.
///
/// Implementations apply the filters themselves and return projects newest
/// first and BD updates by week number, highest first. Visibility scoping is
/// already folded into the filters by the caller.
pub trait DataPort {
    fn list_profiles(&self) -> Result<Vec<Profile>, SalesTrackError>;

    /// Customers ordered by name, each with its PICs attached.
    fn list_customers(&self) -> Result<Vec<Customer>, SalesTrackError>;

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, SalesTrackError>;

    fn list_bd_updates(
        &self,
        filter: &BdUpdateFilter,
    ) -> Result<Vec<BdWeeklyUpdate>, SalesTrackError>;

    /// History notes of one project, newest first.
    fn list_project_updates(&self, project_id: &str)
        -> Result<Vec<ProjectUpdate>, SalesTrackError>;

    fn find_project(&self, project_id: &str) -> Result<Option<Project>, SalesTrackError> {
        Ok(self
            .list_projects(&ProjectFilter::default())?
            .into_iter()
            .find(|p| p.id == project_id))
    }

    fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, SalesTrackError> {
        Ok(self
            .list_profiles()?
            .into_iter()
            .find(|p| p.id == user_id))
    }
}
