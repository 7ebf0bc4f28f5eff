//! GitHub API client for both migration dialects.
//!
//! The GEI (current) dialect is a single cursor-paginated GraphQL query. The
//! legacy dialect is two-level: a page-number-paginated REST listing of
//! organization migrations, plus a cursor-paginated GraphQL sub-query per
//! migration GUID that enumerates its migratable resources. Only resources
//! whose model name is "repository" are kept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::rate_limit::RateLimitWaiter;
use super::GithubClient;
use crate::errors::MonitorError;
use crate::models::{Migration, State};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;

/// Feature opt-in required for GraphQL queries against legacy migrations.
const LEGACY_FEATURE_HEADER: &str = "Graphql-Features";
const LEGACY_FEATURE_VALUE: &str = "gh_migrator_import_to_dotcom";

const LEGACY_FAILURE_REASON: &str = "Unavailable for legacy migrations";

const GEI_MIGRATIONS_QUERY: &str = r#"
query($login: String!, $first: Int!, $after: String) {
  organization(login: $login) {
    repositoryMigrations(first: $first, after: $after) {
      pageInfo { endCursor hasNextPage }
      nodes {
        id
        createdAt
        failureReason
        repositoryName
        state
        migrationLogUrl
      }
    }
  }
}"#;

const MIGRATABLE_RESOURCES_QUERY: &str = r#"
query($login: String!, $guid: String!, $first: Int!, $after: String) {
  organization(login: $login) {
    migration(guid: $guid) {
      migratableResources(first: $first, after: $after) {
        pageInfo { endCursor hasNextPage }
        nodes { targetUrl modelName }
      }
    }
  }
}"#;

/// GitHub API client. Holds no per-call state; every request is constructed
/// locally, so a single instance can serve concurrent callers.
#[derive(Debug)]
pub struct GithubApiClient {
    http: RateLimitWaiter,
    base_url: String,
}

impl GithubApiClient {
    /// Creates a client authenticated with `token`. When `is_legacy` is set,
    /// the feature opt-in header required by the legacy migration GraphQL
    /// surface is attached to every request for the client's lifetime.
    pub fn new(token: &str, is_legacy: bool) -> Result<Self, MonitorError> {
        if token.is_empty() {
            return Err(MonitorError::ConfigError(
                "github token is required".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| MonitorError::ConfigError(format!("invalid github token: {err}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("migration-monitor"));
        if is_legacy {
            headers.insert(
                LEGACY_FEATURE_HEADER,
                HeaderValue::from_static(LEGACY_FEATURE_VALUE),
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(GithubApiClient {
            http: RateLimitWaiter::new(client),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different API host. Used by tests to target a
    /// local mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url)
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        org: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, MonitorError> {
        let request = self
            .http
            .client()
            .post(self.graphql_url())
            .json(&json!({ "query": query, "variables": variables }));

        let response = self.http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::api(
                org,
                format!("GraphQL endpoint returned {status}"),
            ));
        }

        let body: GraphQlResponse<T> = response.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(MonitorError::api(org, messages.join("; ")));
        }

        body.data
            .ok_or_else(|| MonitorError::api(org, "GraphQL response contained no data"))
    }

    async fn list_gei_migrations(&self, org: &str) -> Result<Vec<Migration>, MonitorError> {
        let mut migrations = Vec::new();
        let mut after = Value::Null;

        loop {
            let variables = json!({ "login": org, "first": PAGE_SIZE, "after": after });
            let data: GeiData = self
                .graphql(org, GEI_MIGRATIONS_QUERY, variables)
                .await?;

            let page = data
                .organization
                .ok_or_else(|| MonitorError::api(org, "unknown organization"))?
                .repository_migrations;

            for node in page.nodes {
                migrations.push(Migration {
                    id: node.id,
                    repository_name: node.repository_name.unwrap_or_default(),
                    state: State::new(node.state),
                    created_at: parse_created_at(node.created_at.as_deref()),
                    failure_reason: non_empty(node.failure_reason),
                    migration_log_url: non_empty(node.migration_log_url),
                });
            }

            if !page.page_info.has_next_page {
                break;
            }
            after = match page.page_info.end_cursor {
                Some(cursor) => Value::String(cursor),
                None => break,
            };
        }

        Ok(migrations)
    }

    async fn list_legacy_migrations(&self, org: &str) -> Result<Vec<Migration>, MonitorError> {
        let mut migrations = Vec::new();
        let mut page = 1usize;

        loop {
            let request = self
                .http
                .client()
                .get(format!("{}/orgs/{}/migrations", self.base_url, org))
                .query(&[("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())]);

            let response = self.http.send(request).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(MonitorError::api(
                    org,
                    format!("migration listing returned {status}"),
                ));
            }

            let batch: Vec<LegacyMigrationRecord> = response.json().await?;
            let batch_len = batch.len();

            for record in batch {
                let Some(guid) = record.guid else {
                    continue;
                };

                // A sub-query failure skips only this migration's resources.
                let repositories = match self.list_migratable_repositories(org, &guid).await {
                    Ok(repositories) => repositories,
                    Err(err) => {
                        warn!("skipping resources for legacy migration {guid}: {err}");
                        continue;
                    }
                };

                let state = State::new(record.state.as_deref().unwrap_or_default().to_uppercase());
                let created_at = parse_created_at(record.created_at.as_deref());

                for repository_name in repositories {
                    migrations.push(Migration {
                        id: guid.clone(),
                        repository_name,
                        state: state.clone(),
                        created_at,
                        failure_reason: Some(LEGACY_FAILURE_REASON.to_string()),
                        migration_log_url: record.url.clone(),
                    });
                }
            }

            if batch_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(migrations)
    }

    /// Enumerates the repository resources of one legacy migration. The
    /// cursor starts fresh for every GUID so pages of one migration never
    /// leak into another.
    async fn list_migratable_repositories(
        &self,
        org: &str,
        guid: &str,
    ) -> Result<Vec<String>, MonitorError> {
        let mut repositories = Vec::new();
        let mut after = Value::Null;

        loop {
            let variables = json!({
                "login": org,
                "guid": guid,
                "first": PAGE_SIZE,
                "after": after,
            });
            let data: LegacyData = self
                .graphql(org, MIGRATABLE_RESOURCES_QUERY, variables)
                .await?;

            let page = data
                .organization
                .and_then(|o| o.migration)
                .ok_or_else(|| MonitorError::api(org, format!("migration {guid} not found")))?
                .migratable_resources;

            for resource in page.nodes {
                if resource.model_name == "repository" {
                    repositories.push(resource.target_url);
                }
            }

            if !page.page_info.has_next_page {
                break;
            }
            after = match page.page_info.end_cursor {
                Some(cursor) => Value::String(cursor),
                None => break,
            };
        }

        Ok(repositories)
    }
}

#[async_trait]
impl GithubClient for GithubApiClient {
    async fn list_migrations(
        &self,
        org: &str,
        is_legacy: bool,
    ) -> Result<Vec<Migration>, MonitorError> {
        if is_legacy {
            self.list_legacy_migrations(org).await
        } else {
            self.list_gei_migrations(org).await
        }
    }
}

fn parse_created_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(err) => {
            warn!("failed to parse created_at timestamp '{raw}': {err}");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct GeiData {
    organization: Option<GeiOrganization>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeiOrganization {
    repository_migrations: GeiMigrationPage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeiMigrationPage {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<GeiMigrationNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeiMigrationNode {
    id: String,
    created_at: Option<String>,
    failure_reason: Option<String>,
    repository_name: Option<String>,
    state: String,
    migration_log_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Deserialize)]
struct LegacyData {
    organization: Option<LegacyOrganization>,
}

#[derive(Deserialize)]
struct LegacyOrganization {
    migration: Option<LegacyMigration>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMigration {
    migratable_resources: MigratableResourcePage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MigratableResourcePage {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<MigratableResource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MigratableResource {
    target_url: String,
    model_name: String,
}

#[derive(Deserialize)]
struct LegacyMigrationRecord {
    guid: Option<String>,
    state: Option<String>,
    created_at: Option<String>,
    url: Option<String>,
}
