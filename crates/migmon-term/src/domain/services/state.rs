//! Dashboard state machine: the cached migration set, the filter pipeline
//! and keyboard command routing.
//!
//! `cached_all` is owned exclusively by this state (and therefore by the UI
//! loop that drives it). It is replaced wholesale by every successful
//! refresh; a failed refresh leaves it untouched and only changes the status
//! line.

use anyhow::Result;
use chrono::Local;
use migmon_core::{Migration, MigrationSummary};
use tokio::sync::mpsc;

use crate::domain::models::{Action, Event, FilterOption, InputMode, StatusLine};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Applies the status filter and then the case-insensitive repository-name
/// search. Both stages are independent predicates, so their order does not
/// affect the result.
pub fn apply_pipeline(all: &[Migration], filter: FilterOption, search_term: &str) -> Vec<Migration> {
    let search_lower = search_term.to_lowercase();
    all.iter()
        .filter(|m| filter.matches(&m.state))
        .filter(|m| {
            search_lower.is_empty() || m.repository_name.to_lowercase().contains(&search_lower)
        })
        .cloned()
        .collect()
}

pub struct DashboardState {
    organization: String,
    current_filter: FilterOption,
    search_term: String,
    cached_all: Vec<Migration>,
    filtered: Vec<Migration>,
    mode: InputMode,
    is_refreshing: bool,
    spinner_frame: usize,
    status: StatusLine,
}

impl DashboardState {
    pub fn new(organization: impl Into<String>) -> DashboardState {
        DashboardState {
            organization: organization.into(),
            current_filter: FilterOption::All,
            search_term: String::new(),
            cached_all: Vec::new(),
            filtered: Vec::new(),
            mode: InputMode::Normal,
            is_refreshing: false,
            spinner_frame: 0,
            status: StatusLine::Idle,
        }
    }

    /// Routes one event. Returns `true` when the dashboard should exit.
    pub fn handle_event(
        &mut self,
        event: Event,
        action_tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<bool> {
        match event {
            Event::KeyboardCtrlC => return Ok(true),
            Event::RefreshStarted => {
                self.is_refreshing = true;
            }
            Event::RefreshCompleted(summary) => {
                self.is_refreshing = false;
                self.absorb_summary(&summary);
                self.status = StatusLine::Updated(Local::now());
            }
            Event::RefreshFailed(message) => {
                self.is_refreshing = false;
                self.status = StatusLine::Error(message);
            }
            Event::UITick => {
                if self.is_refreshing {
                    self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
                }
            }
            Event::KeyboardCharInput(c) => match self.mode {
                InputMode::Normal => return self.handle_command_key(c, action_tx),
                InputMode::Search => {
                    self.search_term.push(c);
                    self.apply_filters();
                }
            },
            Event::KeyboardBackspace => {
                if self.mode == InputMode::Search {
                    self.search_term.pop();
                    self.apply_filters();
                }
            }
            Event::KeyboardEnter | Event::KeyboardEsc => {
                if self.mode == InputMode::Search {
                    self.mode = InputMode::Normal;
                }
            }
        }

        Ok(false)
    }

    fn handle_command_key(
        &mut self,
        key: char,
        action_tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<bool> {
        match key {
            'x' => return Ok(true),
            'r' => {
                action_tx.send(Action::TriggerRefresh)?;
            }
            '/' => {
                self.mode = InputMode::Search;
            }
            _ => {
                if let Some(filter) = FilterOption::from_key(key) {
                    self.set_filter(filter);
                }
            }
        }

        Ok(false)
    }

    /// Replaces the cached migration set wholesale with the summary's
    /// buckets, Queued first, Failed last, then re-applies the pipeline.
    pub fn absorb_summary(&mut self, summary: &MigrationSummary) {
        self.cached_all = summary.flatten();
        self.apply_filters();
    }

    pub fn set_filter(&mut self, filter: FilterOption) {
        self.current_filter = filter;
        self.apply_filters();
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.apply_filters();
    }

    fn apply_filters(&mut self) {
        self.filtered = apply_pipeline(&self.cached_all, self.current_filter, &self.search_term);
    }

    pub fn filtered(&self) -> &[Migration] {
        &self.filtered
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn current_filter(&self) -> FilterOption {
        self.current_filter
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_refreshing(&self) -> bool {
        self.is_refreshing
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame]
    }
}
