//! Port traits between the domain and its adapters.

pub mod config_port;
pub mod data_port;
pub mod export_port;
