//! Database operations for the `accounts` table.

use chrono::{DateTime, Utc};
use msgstats_core::{Credentials, ProviderType};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `accounts` table.
///
/// `account_type` is kept as the raw stored tag: rows written by older
/// tooling may carry a provider the registry does not know.
#[derive(Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub account_type: String,
    pub account_name: String,
    pub credentials: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for AccountRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountRow")
            .field("id", &self.id)
            .field("account_type", &self.account_type)
            .field("account_name", &self.account_name)
            .field("credentials", &"[redacted]")
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for [`create_account`]. Credentials are already decoded, so only
/// blobs that pass the codec for `provider_type` can be stored.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub credentials: Credentials,
}

impl NewAccount {
    #[must_use]
    pub fn provider_type(&self) -> ProviderType {
        self.credentials.provider_type()
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, account_type, account_name, credentials, is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all active accounts, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_accounts(pool: &PgPool) -> Result<Vec<AccountRow>, DbError> {
    let rows = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE is_active = true ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single account by id, active or not, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_account(pool: &PgPool, id: i64) -> Result<Option<AccountRow>, DbError> {
    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a new active account together with its zeroed stats row.
///
/// Both inserts run in one transaction so an account never exists without
/// its snapshot.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either insert fails (including a unique
/// violation on the active account name).
pub async fn create_account(pool: &PgPool, account: &NewAccount) -> Result<AccountRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "INSERT INTO accounts (account_type, account_name, credentials) \
         VALUES ($1, $2, $3) \
         RETURNING {ACCOUNT_COLUMNS}"
    ))
    .bind(account.provider_type().as_tag())
    .bind(account.name.trim())
    .bind(Json(account.credentials.encode()))
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO account_stats (account_id, refreshed_at) VALUES ($1, NOW()) \
         ON CONFLICT (account_id) DO NOTHING",
    )
    .bind(row.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Soft-deletes an account by clearing `is_active`. The stats row is kept
/// but no longer listed.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no active account has this id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_account(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE accounts SET is_active = false, updated_at = NOW() \
         WHERE id = $1 AND is_active = true",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
