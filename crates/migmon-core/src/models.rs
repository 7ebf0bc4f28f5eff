//! Typed migration model.
//!
//! A [`Migration`] is immutable once constructed from an API response and is
//! identified by its `id`. The [`State`] tag is kept opaque; classification
//! into the four dashboard groups goes through the predicate methods rather
//! than equality against single tags, since each group covers several tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single repository migration as reported by either API dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    pub id: String,
    pub repository_name: String,
    pub state: State,
    /// `None` when the API reported no timestamp or one that failed to parse.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_log_url: Option<String>,
}

/// The raw state tag of a migration.
///
/// Tags outside the known vocabulary are preserved as-is but belong to no
/// group; they are dropped from every summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(String);

impl State {
    pub fn new(tag: impl Into<String>) -> Self {
        State(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_queued(&self) -> bool {
        matches!(self.0.as_str(), "QUEUED" | "WAITING")
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(
            self.0.as_str(),
            "IN_PROGRESS"
                | "PREPARING"
                | "PENDING"
                | "MAPPING"
                | "ARCHIVE_UPLOADED"
                | "CONFLICTS"
                | "READY"
                | "IMPORTING"
        )
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self.0.as_str(), "SUCCEEDED" | "UNLOCKED" | "IMPORTED")
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.0.as_str(), "FAILED" | "FAILED_IMPORT")
    }

    /// Returns the group this tag belongs to, or `None` for unrecognized
    /// tags. Predicates are evaluated in fixed priority order.
    pub fn group(&self) -> Option<StateGroup> {
        if self.is_queued() {
            Some(StateGroup::Queued)
        } else if self.is_in_progress() {
            Some(StateGroup::InProgress)
        } else if self.is_succeeded() {
            Some(StateGroup::Succeeded)
        } else if self.is_failed() {
            Some(StateGroup::Failed)
        } else {
            None
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for State {
    fn from(tag: &str) -> Self {
        State::new(tag)
    }
}

/// Semantic classification of a migration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateGroup {
    Queued,
    InProgress,
    Succeeded,
    Failed,
}

/// Migrations bucketed by state group, in fetch order within each bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub queued: Vec<Migration>,
    pub in_progress: Vec<Migration>,
    pub succeeded: Vec<Migration>,
    pub failed: Vec<Migration>,
}

impl MigrationSummary {
    pub fn total(&self) -> usize {
        self.queued.len() + self.in_progress.len() + self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Flattens the buckets into a single list, Queued first, Failed last.
    pub fn flatten(&self) -> Vec<Migration> {
        let mut all = Vec::with_capacity(self.total());
        all.extend(self.queued.iter().cloned());
        all.extend(self.in_progress.iter().cloned());
        all.extend(self.succeeded.iter().cloned());
        all.extend(self.failed.iter().cloned());
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOCABULARY: &[&str] = &[
        "QUEUED",
        "WAITING",
        "IN_PROGRESS",
        "PREPARING",
        "PENDING",
        "MAPPING",
        "ARCHIVE_UPLOADED",
        "CONFLICTS",
        "READY",
        "IMPORTING",
        "SUCCEEDED",
        "UNLOCKED",
        "IMPORTED",
        "FAILED",
        "FAILED_IMPORT",
    ];

    fn migration(state: &str) -> Migration {
        Migration {
            id: format!("id-{state}"),
            repository_name: format!("repo-{state}"),
            state: State::new(state),
            created_at: None,
            failure_reason: None,
            migration_log_url: None,
        }
    }

    #[test]
    fn every_known_tag_belongs_to_exactly_one_group() {
        for tag in VOCABULARY {
            let state = State::new(*tag);
            let matches = [
                state.is_queued(),
                state.is_in_progress(),
                state.is_succeeded(),
                state.is_failed(),
            ]
            .iter()
            .filter(|&&m| m)
            .count();
            assert_eq!(matches, 1, "tag {tag} matched {matches} groups");
            assert!(state.group().is_some());
        }
    }

    #[test]
    fn unrecognized_tag_belongs_to_no_group() {
        let state = State::new("BOGUS");
        assert!(!state.is_queued());
        assert!(!state.is_in_progress());
        assert!(!state.is_succeeded());
        assert!(!state.is_failed());
        assert_eq!(state.group(), None);
    }

    #[test]
    fn state_group_matches_predicates() {
        assert_eq!(State::new("WAITING").group(), Some(StateGroup::Queued));
        assert_eq!(
            State::new("ARCHIVE_UPLOADED").group(),
            Some(StateGroup::InProgress)
        );
        assert_eq!(State::new("UNLOCKED").group(), Some(StateGroup::Succeeded));
        assert_eq!(State::new("FAILED_IMPORT").group(), Some(StateGroup::Failed));
    }

    #[test]
    fn summary_total_is_sum_of_bucket_lengths() {
        let summary = MigrationSummary {
            queued: vec![migration("QUEUED")],
            in_progress: vec![migration("PREPARING"), migration("MAPPING")],
            succeeded: vec![migration("IMPORTED")],
            failed: vec![],
        };
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.flatten().len(), summary.total());
    }

    #[test]
    fn flatten_preserves_bucket_order() {
        let summary = MigrationSummary {
            queued: vec![migration("QUEUED")],
            in_progress: vec![migration("READY")],
            succeeded: vec![migration("SUCCEEDED")],
            failed: vec![migration("FAILED")],
        };
        let states: Vec<String> = summary
            .flatten()
            .iter()
            .map(|m| m.state.as_str().to_string())
            .collect();
        assert_eq!(states, vec!["QUEUED", "READY", "SUCCEEDED", "FAILED"]);
    }
}
