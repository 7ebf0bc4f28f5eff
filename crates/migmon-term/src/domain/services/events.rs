//! Event source for the UI loop.
//!
//! Merges three streams with `tokio::select!`: crossterm keyboard input,
//! refresh lifecycle events from the background worker, and a fixed-cadence
//! tick that drives the spinner animation.

use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use crossterm::event::{EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;

use crate::domain::models::Event;

pub struct EventsService {
    crossterm_events: EventStream,
    events: mpsc::UnboundedReceiver<Event>,
}

impl EventsService {
    pub fn new(events: mpsc::UnboundedReceiver<Event>) -> EventsService {
        EventsService {
            crossterm_events: EventStream::new(),
            events,
        }
    }

    fn handle_crossterm(&self, event: CrosstermEvent) -> Option<Event> {
        let CrosstermEvent::Key(keyevent) = event else {
            return None;
        };
        if keyevent.kind == KeyEventKind::Release {
            return None;
        }

        match keyevent.code {
            KeyCode::Char('c') if keyevent.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Event::KeyboardCtrlC)
            }
            KeyCode::Char(c) => Some(Event::KeyboardCharInput(c)),
            KeyCode::Enter => Some(Event::KeyboardEnter),
            KeyCode::Esc => Some(Event::KeyboardEsc),
            KeyCode::Backspace => Some(Event::KeyboardBackspace),
            _ => None,
        }
    }

    pub async fn next(&mut self) -> Result<Event> {
        loop {
            let evt = tokio::select! {
                event = self.events.recv() => event,
                event = self.crossterm_events.next() => match event {
                    Some(Ok(input)) => self.handle_crossterm(input),
                    Some(Err(_)) => None,
                    None => None,
                },
                _ = time::sleep(time::Duration::from_millis(250)) => Some(Event::UITick),
            };

            if let Some(event) = evt {
                return Ok(event);
            }
        }
    }
}
