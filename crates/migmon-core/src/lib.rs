//! Core library for the migration monitor.
//!
//! This crate contains everything that is independent of the terminal
//! interface: the typed migration model, the paginated GitHub API clients for
//! both migration dialects, the aggregation service that buckets migrations
//! by state, and the configuration surface shared with the CLI.

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod service;

pub use api::{GithubApiClient, GithubClient, GithubClientArc};
pub use config::Config;
pub use errors::MonitorError;
pub use models::{Migration, MigrationSummary, State, StateGroup};
pub use service::{summarize, MigrationService};
