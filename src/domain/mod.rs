//! Core domain types and logic.

pub mod week;
pub mod metrics;
pub mod project;
pub mod project_update;
pub mod customer;
pub mod bd_update;
pub mod profile;
pub mod filter;
pub mod format;
pub mod slug;
pub mod export;
pub mod settings;
pub mod config_validation;
pub mod error;
