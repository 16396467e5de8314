//! Weekly business-development (BD) activity log entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::error::SalesTrackError;
use super::week::WeekSpec;

#[derive(Debug, Clone, PartialEq)]
pub struct BdWeeklyUpdate {
    pub id: String,
    pub user_id: String,
    pub year: i32,
    pub week_number: u32,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub content: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BdWeeklyUpdate {
    /// Last edit time, falling back to creation time.
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }

    /// The week this entry was filed against. Not range-checked: stored rows
    /// may carry week numbers the current policy would reject.
    pub fn week(&self) -> WeekSpec {
        WeekSpec::unchecked(self.year, self.week_number)
    }

    /// Trimmed content; `None` when absent or blank.
    pub fn trimmed_content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Groups updates by week number, newest week first. Entries keep their
/// input order within a week.
pub fn group_by_week(updates: &[BdWeeklyUpdate]) -> Vec<(u32, Vec<&BdWeeklyUpdate>)> {
    let mut by_week: BTreeMap<u32, Vec<&BdWeeklyUpdate>> = BTreeMap::new();
    for update in updates {
        by_week.entry(update.week_number).or_default().push(update);
    }
    by_week.into_iter().rev().collect()
}

/// Week number descending; ties keep their order.
pub fn sort_by_week_desc(updates: &mut [BdWeeklyUpdate]) {
    updates.sort_by(|a, b| b.week_number.cmp(&a.week_number));
}

/// A new or edited BD log entry, as submitted by a sales user.
#[derive(Debug, Clone, PartialEq)]
pub struct BdUpdateDraft {
    pub user_id: String,
    pub week: WeekSpec,
    pub customer_id: String,
    pub content: Option<String>,
}

impl BdUpdateDraft {
    pub fn new(
        user_id: impl Into<String>,
        week: WeekSpec,
        customer_id: impl Into<String>,
        content: Option<&str>,
    ) -> Result<Self, SalesTrackError> {
        let customer_id = customer_id.into();
        if customer_id.trim().is_empty() {
            return Err(SalesTrackError::invalid_record(
                "bd update",
                "a customer must be selected",
            ));
        }
        let content = content
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Ok(Self {
            user_id: user_id.into(),
            week,
            customer_id: customer_id.trim().to_string(),
            content,
        })
    }
}
