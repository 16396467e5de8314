//! salestrack: sales project and BD activity tracking.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The [`cli`] module wires them
//! together for the `salestrack` binary.
//!
//! The computational core is [`domain::week`] (ISO week to business-week
//! ranges and labels) and [`domain::metrics`] (dashboard aggregation).

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
