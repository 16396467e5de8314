#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
pub use salestrack::domain::bd_update::BdWeeklyUpdate;
pub use salestrack::domain::customer::{Customer, CustomerPic, Sector};
use salestrack::domain::error::SalesTrackError;
use salestrack::domain::filter::{BdUpdateFilter, ProjectFilter};
pub use salestrack::domain::profile::{Profile, UserRole};
pub use salestrack::domain::project::{ProgressType, Project, Prospect};
pub use salestrack::domain::project_update::ProjectUpdate;
use salestrack::ports::data_port::DataPort;
use std::cell::RefCell;

/// In-memory `DataPort` that applies filters the way the real adapters do
/// and remembers the filters it was called with.
pub struct MockDataPort {
    pub profiles: Vec<Profile>,
    pub customers: Vec<Customer>,
    pub projects: Vec<Project>,
    pub bd_updates: Vec<BdWeeklyUpdate>,
    pub project_updates: Vec<ProjectUpdate>,
    pub fail_with: Option<String>,
    pub project_filters: RefCell<Vec<ProjectFilter>>,
    pub bd_filters: RefCell<Vec<BdUpdateFilter>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            profiles: Vec::new(),
            customers: Vec::new(),
            projects: Vec::new(),
            bd_updates: Vec::new(),
            project_updates: Vec::new(),
            fail_with: None,
            project_filters: RefCell::new(Vec::new()),
            bd_filters: RefCell::new(Vec::new()),
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.push(profile);
        self
    }

    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customers.push(customer);
        self
    }

    pub fn with_project(mut self, project: Project) -> Self {
        self.projects.push(project);
        self
    }

    pub fn with_bd_update(mut self, update: BdWeeklyUpdate) -> Self {
        self.bd_updates.push(update);
        self
    }

    pub fn with_project_update(mut self, update: ProjectUpdate) -> Self {
        self.project_updates.push(update);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.fail_with = Some(reason.to_string());
        self
    }

    fn check(&self) -> Result<(), SalesTrackError> {
        match &self.fail_with {
            Some(reason) => Err(SalesTrackError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn list_profiles(&self) -> Result<Vec<Profile>, SalesTrackError> {
        self.check()?;
        Ok(self.profiles.clone())
    }

    fn list_customers(&self) -> Result<Vec<Customer>, SalesTrackError> {
        self.check()?;
        let mut customers = self.customers.clone();
        customers.sort_by_key(|c| c.name.to_lowercase());
        Ok(customers)
    }

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, SalesTrackError> {
        self.check()?;
        self.project_filters.borrow_mut().push(filter.clone());
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    fn list_bd_updates(
        &self,
        filter: &BdUpdateFilter,
    ) -> Result<Vec<BdWeeklyUpdate>, SalesTrackError> {
        self.check()?;
        self.bd_filters.borrow_mut().push(filter.clone());
        let mut updates: Vec<BdWeeklyUpdate> = self
            .bd_updates
            .iter()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        updates.sort_by(|a, b| b.week_number.cmp(&a.week_number));
        Ok(updates)
    }

    fn list_project_updates(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectUpdate>, SalesTrackError> {
        self.check()?;
        let mut updates: Vec<ProjectUpdate> = self
            .project_updates
            .iter()
            .filter(|u| u.project_id == project_id)
            .cloned()
            .collect();
        updates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(updates)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

pub fn make_profile(id: &str, name: &str, role: UserRole) -> Profile {
    Profile {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        full_name: Some(name.to_string()),
        display_name: None,
        role,
    }
}

pub fn make_customer(id: &str, name: &str) -> Customer {
    Customer {
        id: id.to_string(),
        name: name.to_string(),
        sector: Some(Sector::Industrial),
        created_at: Some(ts(2026, 1, 5)),
        pics: Vec::new(),
    }
}

pub fn make_project(
    id: &str,
    sales_id: &str,
    value: f64,
    progress_type: ProgressType,
    prospect: Prospect,
) -> Project {
    Project {
        id: id.to_string(),
        created_at: ts(2026, 2, 1),
        no_quote: format!("Q-{id}"),
        project_name: format!("Project {id}"),
        customer_id: "c1".to_string(),
        customer_name: Some("PT Sinar".to_string()),
        value: Some(value),
        progress_type: Some(progress_type),
        prospect: Some(prospect),
        weekly_update: None,
        sales_id: sales_id.to_string(),
    }
}

pub fn make_bd_update(id: &str, user_id: &str, year: i32, week: u32) -> BdWeeklyUpdate {
    BdWeeklyUpdate {
        id: id.to_string(),
        user_id: user_id.to_string(),
        year,
        week_number: week,
        customer_id: Some("c1".to_string()),
        customer_name: Some("PT Sinar".to_string()),
        content: Some(format!("update {id}")),
        created_at: Some(ts(year, 3, 2)),
        updated_at: None,
    }
}

pub fn make_project_update(id: &str, project_id: &str, day: u32, by: Option<&str>) -> ProjectUpdate {
    ProjectUpdate {
        id: id.to_string(),
        project_id: project_id.to_string(),
        content: format!("note {id}"),
        created_at: ts(2026, 3, day),
        created_by: by.map(str::to_string),
    }
}

/// Two sales users and one admin, with projects and BD updates for each
/// sales user and history notes on p1.
pub fn seeded_port() -> MockDataPort {
    MockDataPort::new()
        .with_profile(make_profile("u1", "Andi", UserRole::Sales))
        .with_profile(make_profile("u2", "Budi", UserRole::Sales))
        .with_profile(make_profile("a1", "Citra", UserRole::Admin))
        .with_customer(make_customer("c1", "PT Sinar"))
        .with_project(make_project("p1", "u1", 1_000.0, ProgressType::Win, Prospect::HotProspect))
        .with_project(make_project("p2", "u1", 2_000.0, ProgressType::Lose, Prospect::HotProspect))
        .with_project(make_project("p3", "u2", 4_000.0, ProgressType::Tender, Prospect::Normal))
        .with_project(make_project("p4", "u2", 8_000.0, ProgressType::Budgetary, Prospect::HotProspect))
        .with_bd_update(make_bd_update("b1", "u1", 2026, 10))
        .with_bd_update(make_bd_update("b2", "u2", 2026, 12))
        .with_bd_update(make_bd_update("b3", "u1", 2025, 52))
        .with_project_update(make_project_update("n1", "p1", 3, Some("u1")))
        .with_project_update(make_project_update("n2", "p1", 9, None))
}
