//! Terminal UI loop.
//!
//! Single-threaded with respect to rendering state: this loop is the only
//! place dashboard state is mutated. Background work arrives as events
//! through [`EventsService`].

use anyhow::Result;
use crossterm::cursor;
use crossterm::terminal::{disable_raw_mode, LeaveAlternateScreen};
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;

use super::table::MigrationTable;
use crate::domain::models::{Action, Event, InputMode, StatusLine};
use crate::domain::services::{DashboardState, EventsService};

/// Restores the terminal from a panic handler, where the usual cleanup path
/// is unreachable.
pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(std::io::stdout(), LeaveAlternateScreen);
    let _ = crossterm::execute!(std::io::stdout(), cursor::Show);
}

pub async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    mut state: DashboardState,
    action_tx: mpsc::UnboundedSender<Action>,
    event_rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut events = EventsService::new(event_rx);
    let mut table = MigrationTable::new(format!(
        "Migration Status - {}",
        state.organization()
    ));

    loop {
        table.set_title(state.organization(), state.current_filter());
        table.update_data(state.filtered());
        terminal.draw(|frame| render(frame, &state, &table))?;

        let event = events.next().await?;
        if state.handle_event(event, &action_tx)? {
            break;
        }
    }

    Ok(())
}

fn render(frame: &mut Frame, state: &DashboardState, table: &MigrationTable) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    frame.render_widget(table.widget(), layout[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(32)])
        .split(layout[1]);

    frame.render_widget(command_bar(state), bottom[0]);
    frame.render_widget(status_bar(state), bottom[1]);
}

fn command_bar(state: &DashboardState) -> Paragraph<'_> {
    if state.mode() == InputMode::Search {
        return Paragraph::new(Line::from(vec![
            Span::styled(
                "Search: ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(state.search_term().to_string()),
            Span::styled("█", Style::default().fg(Color::Gray)),
            Span::styled("  (Enter/Esc to close)", Style::default().fg(Color::DarkGray)),
        ]));
    }

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::White));
    let label = |l: &'static str| Span::styled(l, Style::default().fg(Color::DarkGray));
    let section = |s: &'static str| {
        Span::styled(
            s,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    };

    Paragraph::new(Line::from(vec![
        section("Commands: "),
        key("r"),
        label(" Refresh  "),
        key("/"),
        label(" Search  "),
        key("x"),
        label(" Exit  "),
        section("Filters: "),
        key("a"),
        label(" All  "),
        key("q"),
        label(" Queued  "),
        key("i"),
        label(" In Progress  "),
        key("s"),
        label(" Succeeded  "),
        key("f"),
        label(" Failed"),
    ]))
}

fn status_bar(state: &DashboardState) -> Paragraph<'_> {
    let line = if state.is_refreshing() {
        Line::from(Span::styled(
            format!("{} Refreshing...", state.spinner()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        match state.status() {
            StatusLine::Idle => Line::from(Span::raw("")),
            StatusLine::Updated(at) => Line::from(Span::styled(
                format!("Last updated: {}", at.format("%H:%M:%S")),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            StatusLine::Error(message) => Line::from(Span::styled(
                format!("Error: {message}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
        }
    };

    Paragraph::new(line).alignment(Alignment::Right)
}
