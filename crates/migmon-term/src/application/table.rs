//! Migration table component.
//!
//! Holds the title and pre-formatted rows and produces a ratatui `Table` on
//! demand. It renders whatever filtered set it is given; filtering and
//! fetching decisions live in the domain layer.

use migmon_core::{Migration, StateGroup};
use ratatui::layout::Constraint;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};

use crate::domain::models::FilterOption;

pub struct MigrationTable {
    title: String,
    rows: Vec<TableRow>,
}

struct TableRow {
    repository: String,
    id: String,
    status: String,
    group: Option<StateGroup>,
    created_at: String,
}

impl MigrationTable {
    pub fn new(title: impl Into<String>) -> MigrationTable {
        MigrationTable {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, organization: &str, filter: FilterOption) {
        self.title = match filter {
            FilterOption::All => format!("Migration Status - {organization}"),
            other => format!("Migration Status - {organization} [{other}]"),
        };
    }

    pub fn update_data(&mut self, migrations: &[Migration]) {
        self.rows = migrations
            .iter()
            .map(|migration| TableRow {
                repository: migration.repository_name.clone(),
                id: migration.id.clone(),
                status: migration.state.as_str().to_string(),
                group: migration.state.group(),
                created_at: format_created_at(migration),
            })
            .collect();
    }

    pub fn widget(&self) -> Table<'_> {
        let header = Row::new(["Repository Name", "Migration ID", "Status", "Created At"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.rows.iter().map(|row| {
            Row::new(vec![
                Cell::from(row.repository.as_str()),
                Cell::from(row.id.as_str()),
                Cell::from(row.status.as_str())
                    .style(Style::default().fg(status_color(row.group))),
                Cell::from(row.created_at.as_str()),
            ])
        });

        Table::new(
            rows,
            [
                Constraint::Percentage(40),
                Constraint::Percentage(25),
                Constraint::Percentage(15),
                Constraint::Percentage(20),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(self.title.as_str()),
        )
    }
}

fn format_created_at(migration: &Migration) -> String {
    match migration.created_at {
        Some(created_at) => created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Unknown".to_string(),
    }
}

fn status_color(group: Option<StateGroup>) -> Color {
    match group {
        Some(StateGroup::Queued) => Color::Blue,
        Some(StateGroup::InProgress) => Color::Yellow,
        Some(StateGroup::Succeeded) => Color::Green,
        Some(StateGroup::Failed) => Color::Red,
        None => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use migmon_core::State;

    fn migration(repo: &str, state: &str) -> Migration {
        Migration {
            id: format!("id-{repo}"),
            repository_name: repo.to_string(),
            state: State::new(state),
            created_at: None,
            failure_reason: None,
            migration_log_url: None,
        }
    }

    #[test]
    fn title_includes_filter_only_when_filtered() {
        let mut table = MigrationTable::new("Migration Status");

        table.set_title("acme", FilterOption::All);
        assert_eq!(table.title(), "Migration Status - acme");

        table.set_title("acme", FilterOption::InProgress);
        assert_eq!(table.title(), "Migration Status - acme [In Progress]");
    }

    #[test]
    fn missing_timestamp_renders_unknown() {
        assert_eq!(format_created_at(&migration("repo", "QUEUED")), "Unknown");

        let mut with_time = migration("repo", "QUEUED");
        with_time.created_at = Some(Utc.with_ymd_and_hms(2023, 5, 1, 12, 30, 0).unwrap());
        assert_eq!(format_created_at(&with_time), "2023-05-01 12:30:00");
    }

    #[test]
    fn update_data_replaces_rows() {
        let mut table = MigrationTable::new("Migration Status");
        table.update_data(&[migration("one", "QUEUED"), migration("two", "FAILED")]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].repository, "one");
        assert_eq!(table.rows[1].status, "FAILED");

        table.update_data(&[]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn status_colors_follow_state_group() {
        assert_eq!(status_color(Some(StateGroup::Succeeded)), Color::Green);
        assert_eq!(status_color(Some(StateGroup::Failed)), Color::Red);
        assert_eq!(status_color(Some(StateGroup::InProgress)), Color::Yellow);
        assert_eq!(status_color(Some(StateGroup::Queued)), Color::Blue);
        assert_eq!(status_color(None), Color::White);
    }
}
