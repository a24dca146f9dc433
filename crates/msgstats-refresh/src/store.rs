//! The two persistence seams a refresh cycle needs, implemented for `PgPool`.

use std::future::Future;

use msgstats_core::StatsSnapshot;
use msgstats_db::{AccountRow, DbError};
use sqlx::PgPool;

/// An account as loaded at the start of a cycle. The provider tag and the
/// credential blob are still raw; planning resolves and decodes them.
#[derive(Debug, Clone)]
pub struct ActiveAccount {
    pub id: i64,
    pub provider_tag: String,
    pub credentials: serde_json::Value,
}

impl From<AccountRow> for ActiveAccount {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            provider_tag: row.account_type,
            credentials: row.credentials,
        }
    }
}

/// Source of the accounts a cycle refreshes.
pub trait AccountSource: Sync {
    /// Returns every active account, read once per cycle.
    fn load_active_accounts(&self)
        -> impl Future<Output = Result<Vec<ActiveAccount>, DbError>> + Send;
}

/// Sink for per-account snapshots. Calls for different accounts may run
/// concurrently.
pub trait SnapshotStore: Sync {
    /// Inserts or replaces the single snapshot row for `snapshot.account_id`.
    fn upsert_snapshot(
        &self,
        snapshot: &StatsSnapshot,
    ) -> impl Future<Output = Result<(), DbError>> + Send;
}

impl AccountSource for PgPool {
    fn load_active_accounts(
        &self,
    ) -> impl Future<Output = Result<Vec<ActiveAccount>, DbError>> + Send {
        async move {
            let rows = msgstats_db::list_active_accounts(self).await?;
            Ok(rows.into_iter().map(ActiveAccount::from).collect())
        }
    }
}

impl SnapshotStore for PgPool {
    fn upsert_snapshot(
        &self,
        snapshot: &StatsSnapshot,
    ) -> impl Future<Output = Result<(), DbError>> + Send {
        msgstats_db::upsert_account_stats(self, snapshot)
    }
}
