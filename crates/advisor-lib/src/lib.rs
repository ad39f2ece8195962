//! Advisor library for process memory budgets
//!
//! This crate provides the core functionality for:
//! - Turning a measured memory profile into heap and container limits
//! - Exact safety-margin arithmetic
//! - Byte quantity parsing and formatting
//! - Structured logging of advisory events

pub mod advisor;
pub mod error;
pub mod margin;
pub mod models;
pub mod observability;
pub mod units;

pub use advisor::{aggregate_fleet_budget, compute_recommendation};
pub use error::{fields, AdvisorError};
pub use margin::{MarginParseError, SafetyMargin};
pub use models::*;
pub use observability::StructuredLogger;
