//! Database operations for `account_stats`, the one-row-per-account snapshot table.

use chrono::{DateTime, Utc};
use msgstats_core::StatsSnapshot;
use sqlx::PgPool;

use crate::{count_from_db, count_to_db, DbError};

/// A row from the `account_stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountStatsRow {
    pub account_id: i64,
    pub total_messages: i64,
    pub unread_messages: i64,
    pub oldest_unread_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub refreshed_at: DateTime<Utc>,
}

impl From<AccountStatsRow> for StatsSnapshot {
    fn from(row: AccountStatsRow) -> Self {
        Self {
            account_id: row.account_id,
            total_messages: count_from_db(row.total_messages),
            unread_messages: count_from_db(row.unread_messages),
            oldest_unread_at: row.oldest_unread_at,
            last_error: row.last_error,
            refreshed_at: row.refreshed_at,
        }
    }
}

/// A stats row joined with its (active) account, for the read surface.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatsRow {
    pub account_id: i64,
    pub account_name: String,
    pub account_type: String,
    pub total_messages: i64,
    pub unread_messages: i64,
    pub oldest_unread_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub refreshed_at: DateTime<Utc>,
}

/// Inserts or replaces the snapshot for `snapshot.account_id`.
///
/// Conflicts on `account_id` overwrite every column, so repeating the call
/// with the same snapshot leaves exactly the same single row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, e.g. when the account does
/// not exist.
pub async fn upsert_account_stats(pool: &PgPool, snapshot: &StatsSnapshot) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO account_stats \
             (account_id, total_messages, unread_messages, oldest_unread_at, last_error, refreshed_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (account_id) DO UPDATE SET \
             total_messages   = EXCLUDED.total_messages, \
             unread_messages  = EXCLUDED.unread_messages, \
             oldest_unread_at = EXCLUDED.oldest_unread_at, \
             last_error       = EXCLUDED.last_error, \
             refreshed_at     = EXCLUDED.refreshed_at",
    )
    .bind(snapshot.account_id)
    .bind(count_to_db(snapshot.total_messages))
    .bind(count_to_db(snapshot.unread_messages))
    .bind(snapshot.oldest_unread_at)
    .bind(snapshot.last_error.as_deref())
    .bind(snapshot.refreshed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the current snapshot for one account, or `None` if it has none.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_account_stats(
    pool: &PgPool,
    account_id: i64,
) -> Result<Option<StatsSnapshot>, DbError> {
    let row = sqlx::query_as::<_, AccountStatsRow>(
        "SELECT account_id, total_messages, unread_messages, oldest_unread_at, \
                last_error, refreshed_at \
         FROM account_stats \
         WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(StatsSnapshot::from))
}

/// Returns snapshots for all active accounts, joined with name and type.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stats(pool: &PgPool) -> Result<Vec<StatsRow>, DbError> {
    let rows = sqlx::query_as::<_, StatsRow>(
        "SELECT s.account_id, a.account_name, a.account_type, \
                s.total_messages, s.unread_messages, s.oldest_unread_at, \
                s.last_error, s.refreshed_at \
         FROM account_stats s \
         JOIN accounts a ON a.id = s.account_id \
         WHERE a.is_active = true \
         ORDER BY s.account_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
