//! Terminal dashboard for the migration monitor.
//!
//! The domain layer owns the refresh/filter engine and the event plumbing;
//! the application layer renders the filtered migration set and routes
//! keyboard input. Background fetches never touch UI state directly: the
//! refresh worker hands summaries to the UI loop over an event channel.

pub mod application;
pub mod domain;

pub use application::ui::{destruct_terminal_for_panic, start_loop};
pub use domain::models::{Action, Event, FilterOption};
pub use domain::services::{DashboardState, RefreshService};
