//! Background refresh worker.
//!
//! Fires on a fixed interval (the first tick completes immediately and gives
//! the initial load) and on manual triggers from the UI. The fetch itself
//! runs in a spawned task so the worker stays responsive to cancellation; a
//! single in-flight flag drops triggers that arrive while a fetch is still
//! running, so concurrent fetches never occur. Results travel back to the UI
//! loop as events — the worker never mutates dashboard state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, error};
use migmon_core::MigrationService;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::domain::models::{Action, Event};

pub struct RefreshService {}

impl RefreshService {
    pub async fn start(
        service: Arc<MigrationService>,
        organization: String,
        is_legacy: bool,
        interval: Duration,
        event_tx: mpsc::UnboundedSender<Event>,
        action_rx: &mut mpsc::UnboundedReceiver<Action>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let in_flight = Arc::new(AtomicBool::new(false));
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    spawn_refresh(&service, &organization, is_legacy, &event_tx, &in_flight);
                }
                action = action_rx.recv() => match action {
                    Some(Action::TriggerRefresh) => {
                        spawn_refresh(&service, &organization, is_legacy, &event_tx, &in_flight);
                    }
                    None => break,
                },
            }
        }

        Ok(())
    }
}

fn spawn_refresh(
    service: &Arc<MigrationService>,
    organization: &str,
    is_legacy: bool,
    event_tx: &mpsc::UnboundedSender<Event>,
    in_flight: &Arc<AtomicBool>,
) {
    if in_flight.swap(true, Ordering::SeqCst) {
        debug!("refresh already in flight, dropping trigger");
        return;
    }

    let _ = event_tx.send(Event::RefreshStarted);

    let service = service.clone();
    let organization = organization.to_string();
    let event_tx = event_tx.clone();
    let in_flight = in_flight.clone();

    tokio::spawn(async move {
        let result = service.fetch_summary(&organization, is_legacy).await;
        // Clear the flag before reporting back, so a trigger that reacts to
        // the completion event is never dropped.
        in_flight.store(false, Ordering::SeqCst);
        match result {
            Ok(summary) => {
                let _ = event_tx.send(Event::RefreshCompleted(summary));
            }
            Err(err) => {
                error!("refresh failed for {organization}: {err}");
                let _ = event_tx.send(Event::RefreshFailed(err.to_string()));
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use migmon_core::{GithubClient, Migration, MonitorError, State};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    /// Client that blocks each fetch until the gate is released, counting
    /// calls so tests can observe how many fetches were actually issued.
    struct GatedClient {
        calls: AtomicUsize,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl GithubClient for GatedClient {
        async fn list_migrations(
            &self,
            _org: &str,
            _is_legacy: bool,
        ) -> Result<Vec<Migration>, MonitorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(vec![Migration {
                id: "m1".to_string(),
                repository_name: "repo".to_string(),
                state: State::new("QUEUED"),
                created_at: None,
                failure_reason: None,
                migration_log_url: None,
            }])
        }
    }

    async fn wait_for_completion(event_rx: &mut mpsc::UnboundedReceiver<Event>) {
        loop {
            let event = timeout(WAIT, event_rx.recv())
                .await
                .expect("timed out waiting for refresh completion")
                .expect("event channel closed");
            if matches!(event, Event::RefreshCompleted(_)) {
                return;
            }
        }
    }

    #[tokio::test]
    async fn triggers_while_in_flight_are_dropped() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(GatedClient {
            calls: AtomicUsize::new(0),
            gate: gate.clone(),
        });
        let service = Arc::new(MigrationService::new(client.clone()));

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let worker_cancel = cancel.clone();
        tokio::spawn(async move {
            RefreshService::start(
                service,
                "acme".to_string(),
                false,
                Duration::from_secs(3600),
                event_tx,
                &mut action_rx,
                worker_cancel,
            )
            .await
        });

        // The interval's first tick starts the initial fetch, which is now
        // blocked on the gate.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        // Triggers while the fetch is in flight must be no-ops.
        action_tx.send(Action::TriggerRefresh).unwrap();
        action_tx.send(Action::TriggerRefresh).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        gate.notify_one();
        wait_for_completion(&mut event_rx).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        // Once idle again, a trigger starts a new fetch.
        action_tx.send(Action::TriggerRefresh).unwrap();
        gate.notify_one();
        wait_for_completion(&mut event_rx).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);

        cancel.cancel();
    }

    #[tokio::test]
    async fn cancellation_stops_the_worker_promptly() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(GatedClient {
            calls: AtomicUsize::new(0),
            gate: gate.clone(),
        });
        let service = Arc::new(MigrationService::new(client));

        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let (_action_tx, mut action_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let worker_cancel = cancel.clone();
        let worker = tokio::spawn(async move {
            RefreshService::start(
                service,
                "acme".to_string(),
                false,
                Duration::from_secs(3600),
                event_tx,
                &mut action_rx,
                worker_cancel,
            )
            .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let result = timeout(WAIT, worker)
            .await
            .expect("worker did not exit after cancellation")
            .unwrap();
        assert!(result.is_ok());
    }
}
