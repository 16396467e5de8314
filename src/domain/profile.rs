//! User profiles and sales-name lookup.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::SalesTrackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRole {
    Admin,
    Sales,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Sales => "sales",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = SalesTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(UserRole::Admin),
            "sales" => Ok(UserRole::Sales),
            other => Err(SalesTrackError::invalid_record(
                "role",
                format!("unknown role {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub role: UserRole,
}

impl Profile {
    /// `display_name`, then `full_name`, then the first 8 characters of the id.
    pub fn display(&self) -> String {
        self.display_name
            .as_deref()
            .or(self.full_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| short_id(&self.id))
    }
}

/// First 8 characters of a user id, the fallback label for unknown users.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Maps user ids to the names shown in tables and exports.
#[derive(Debug, Clone, Default)]
pub struct SalesDirectory {
    names: HashMap<String, String>,
}

impl SalesDirectory {
    pub fn from_profiles(profiles: &[Profile]) -> Self {
        let names = profiles
            .iter()
            .map(|p| (p.id.clone(), p.display()))
            .collect();
        Self { names }
    }

    pub fn name_for(&self, user_id: &str) -> String {
        self.names
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| short_id(user_id))
    }
}
