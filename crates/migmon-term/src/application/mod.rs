//! Presentation layer: the migration table and the terminal UI loop.

pub mod table;
pub mod ui;
