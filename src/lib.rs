//! Per-field irrigation and fertilizer planning.
//!
//! The engines in [`logic`] are pure calculations over the value types in
//! [`models`]. [`logic::advisor::FieldAdvisor`] resolves field records through
//! the [`datasources`] traits and runs the engines on them.

pub mod config;
pub mod datasources;
pub mod error;
pub mod logic;
pub mod models;

pub use config::Config;
pub use error::{FieldPlanError, Result};
