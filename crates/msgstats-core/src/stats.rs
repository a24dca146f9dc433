use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counts produced by one provider fetch, before they are tied to an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedStats {
    pub total_messages: u64,
    pub unread_messages: u64,
    pub oldest_unread_at: Option<DateTime<Utc>>,
    /// Sub-calls that failed while the fetch as a whole still produced a
    /// best-effort result.
    pub partial_failures: Vec<String>,
}

impl FetchedStats {
    /// Fold `candidate` into `oldest_unread_at`, keeping the earlier instant.
    pub fn observe_unread_at(&mut self, candidate: DateTime<Utc>) {
        self.oldest_unread_at = Some(match self.oldest_unread_at {
            Some(current) if current <= candidate => current,
            _ => candidate,
        });
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.partial_failures.is_empty()
    }
}

/// The single current stats row stored per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub account_id: i64,
    pub total_messages: u64,
    pub unread_messages: u64,
    pub oldest_unread_at: Option<DateTime<Utc>>,
    /// Failure kind of the refresh that wrote this row; `None` on success.
    pub last_error: Option<String>,
    pub refreshed_at: DateTime<Utc>,
}

impl StatsSnapshot {
    #[must_use]
    pub fn from_fetched(account_id: i64, fetched: &FetchedStats, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            total_messages: fetched.total_messages,
            unread_messages: fetched.unread_messages,
            oldest_unread_at: fetched.oldest_unread_at,
            last_error: None,
            refreshed_at,
        }
    }

    /// The all-zero row written when a refresh for the account failed.
    #[must_use]
    pub fn zeroed(account_id: i64, failure: &FailureReason, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            total_messages: 0,
            unread_messages: 0,
            oldest_unread_at: None,
            last_error: Some(failure.kind().to_owned()),
            refreshed_at,
        }
    }
}

/// Why one account's refresh did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    UnknownProvider(String),
    Credentials(String),
    Fetch(String),
    Timeout { secs: u64 },
    Storage(String),
}

impl FailureReason {
    /// Stable short tag, persisted in `account_stats.last_error`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::UnknownProvider(_) => "unknown_provider",
            FailureReason::Credentials(_) => "credential_decode",
            FailureReason::Fetch(_) => "provider_fetch",
            FailureReason::Timeout { .. } => "timeout",
            FailureReason::Storage(_) => "storage",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::UnknownProvider(tag) => write!(f, "unknown provider type '{tag}'"),
            FailureReason::Credentials(reason) => write!(f, "credential decode failed: {reason}"),
            FailureReason::Fetch(reason) => write!(f, "provider fetch failed: {reason}"),
            FailureReason::Timeout { secs } => write!(f, "provider fetch timed out after {secs}s"),
            FailureReason::Storage(reason) => write!(f, "snapshot upsert failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failure(FailureReason),
}

/// Per-account result of one refresh cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub account_id: i64,
    pub status: OutcomeStatus,
}

impl RefreshOutcome {
    #[must_use]
    pub fn success(account_id: i64) -> Self {
        Self {
            account_id,
            status: OutcomeStatus::Success,
        }
    }

    #[must_use]
    pub fn failure(account_id: i64, reason: FailureReason) -> Self {
        Self {
            account_id,
            status: OutcomeStatus::Failure(reason),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn observe_unread_at_keeps_the_earliest_instant() {
        let mut stats = FetchedStats::default();
        let later = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        stats.observe_unread_at(later);
        stats.observe_unread_at(earlier);
        stats.observe_unread_at(later);

        assert_eq!(stats.oldest_unread_at, Some(earlier));
    }

    #[test]
    fn zeroed_snapshot_records_failure_kind_only() {
        let now = Utc::now();
        let snapshot = StatsSnapshot::zeroed(
            7,
            &FailureReason::Fetch("HTTP 500 from graph.facebook.com".to_string()),
            now,
        );
        assert_eq!(snapshot.total_messages, 0);
        assert_eq!(snapshot.unread_messages, 0);
        assert!(snapshot.oldest_unread_at.is_none());
        assert_eq!(snapshot.last_error.as_deref(), Some("provider_fetch"));
    }

    #[test]
    fn from_fetched_clears_last_error() {
        let fetched = FetchedStats {
            total_messages: 10,
            unread_messages: 2,
            oldest_unread_at: None,
            partial_failures: vec!["messages: HTTP 500".to_string()],
        };
        let snapshot = StatsSnapshot::from_fetched(1, &fetched, Utc::now());
        assert_eq!(snapshot.total_messages, 10);
        assert_eq!(snapshot.unread_messages, 2);
        assert!(snapshot.last_error.is_none());
    }

    #[test]
    fn failure_kinds_are_stable() {
        assert_eq!(FailureReason::Timeout { secs: 5 }.kind(), "timeout");
        assert_eq!(
            FailureReason::Credentials(String::new()).kind(),
            "credential_decode"
        );
        assert_eq!(
            FailureReason::UnknownProvider("X".to_string()).to_string(),
            "unknown provider type 'X'"
        );
    }
}
