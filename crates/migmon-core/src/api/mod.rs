//! GitHub API access for both migration dialects.

mod github;
mod rate_limit;

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::MonitorError;
use crate::models::Migration;

pub use github::GithubApiClient;
pub use rate_limit::RateLimitWaiter;

/// Interface for listing an organization's repository migrations.
///
/// Implementations are stateless across calls; every invocation rebuilds its
/// own requests so the client is safe to share between tasks.
#[async_trait]
pub trait GithubClient: Send + Sync {
    /// Returns all migrations for the organization, in fetch order.
    ///
    /// `is_legacy` selects the older page-number-paginated dialect that
    /// requires a secondary per-migration resource query.
    async fn list_migrations(
        &self,
        org: &str,
        is_legacy: bool,
    ) -> Result<Vec<Migration>, MonitorError>;
}

pub type GithubClientArc = Arc<dyn GithubClient>;
