//! Aggregation of raw migration records into the dashboard summary.

use std::sync::Arc;

use log::debug;

use crate::api::GithubClient;
use crate::errors::MonitorError;
use crate::models::{Migration, MigrationSummary, StateGroup};

/// Buckets records by state group, preserving fetch order within each bucket.
///
/// Records with an unrecognized state tag are dropped; they appear in no
/// bucket and do not count toward the summary total.
pub fn summarize(records: Vec<Migration>) -> MigrationSummary {
    let mut summary = MigrationSummary::default();

    for migration in records {
        match migration.state.group() {
            Some(StateGroup::Queued) => summary.queued.push(migration),
            Some(StateGroup::InProgress) => summary.in_progress.push(migration),
            Some(StateGroup::Succeeded) => summary.succeeded.push(migration),
            Some(StateGroup::Failed) => summary.failed.push(migration),
            None => {
                debug!(
                    "dropping migration {} with unrecognized state '{}'",
                    migration.id, migration.state
                );
            }
        }
    }

    summary
}

/// Fetches and aggregates migrations for one organization.
pub struct MigrationService {
    client: Arc<dyn GithubClient>,
}

impl MigrationService {
    pub fn new(client: Arc<dyn GithubClient>) -> Self {
        MigrationService { client }
    }

    /// Lists all migrations via the selected API dialect and buckets them by
    /// state. A fetch failure is fatal for this call and yields no partial
    /// summary.
    pub async fn fetch_summary(
        &self,
        org: &str,
        is_legacy: bool,
    ) -> Result<MigrationSummary, MonitorError> {
        let records = self.client.list_migrations(org, is_legacy).await?;
        Ok(summarize(records))
    }
}
