//! Models shared between the dashboard state machine, the refresh worker and
//! the presentation layer.

use chrono::{DateTime, Local};
use migmon_core::{MigrationSummary, State};

/// Events consumed by the UI loop. Keyboard input arrives from crossterm,
/// refresh lifecycle events from the background worker, and `UITick` on a
/// fixed cadence to drive the spinner.
#[derive(Debug)]
pub enum Event {
    RefreshStarted,
    RefreshCompleted(MigrationSummary),
    RefreshFailed(String),
    KeyboardCharInput(char),
    KeyboardEnter,
    KeyboardEsc,
    KeyboardBackspace,
    KeyboardCtrlC,
    UITick,
}

/// Requests sent from the UI loop to the background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TriggerRefresh,
}

/// Status filter applied to the cached migration set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum FilterOption {
    #[default]
    All,
    Queued,
    #[strum(serialize = "In Progress")]
    InProgress,
    Succeeded,
    Failed,
}

impl FilterOption {
    /// Maps a filter shortcut key to its option.
    pub fn from_key(key: char) -> Option<FilterOption> {
        match key {
            'a' => Some(FilterOption::All),
            'q' => Some(FilterOption::Queued),
            'i' => Some(FilterOption::InProgress),
            's' => Some(FilterOption::Succeeded),
            'f' => Some(FilterOption::Failed),
            _ => None,
        }
    }

    /// Whether a migration in `state` passes this filter. `All` passes
    /// everything, including unrecognized states.
    pub fn matches(&self, state: &State) -> bool {
        match self {
            FilterOption::All => true,
            FilterOption::Queued => state.is_queued(),
            FilterOption::InProgress => state.is_in_progress(),
            FilterOption::Succeeded => state.is_succeeded(),
            FilterOption::Failed => state.is_failed(),
        }
    }
}

/// Whether keystrokes feed the command map or the search field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
}

/// Message shown in the status bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusLine {
    #[default]
    Idle,
    Updated(DateTime<Local>),
    Error(String),
}
