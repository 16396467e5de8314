//! Free-text history notes attached to a project.

use chrono::{DateTime, Utc};

use super::error::SalesTrackError;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectUpdate {
    pub id: String,
    pub project_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Author's user id; older rows may not carry one.
    pub created_by: Option<String>,
}

/// Newest first, the order a project's history is shown in.
pub fn sort_history(updates: &mut [ProjectUpdate]) {
    updates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Trimmed note text; blank notes are rejected.
pub fn note_content(raw: &str) -> Result<String, SalesTrackError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(SalesTrackError::invalid_record(
            "project update",
            "content is required",
        ));
    }
    Ok(content.to_string())
}
