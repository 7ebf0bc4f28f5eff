//! Core domain logic for the dashboard.
//!
//! Contains the models and services that drive the terminal UI, independent
//! of how anything is rendered.

pub mod models;
pub mod services;
