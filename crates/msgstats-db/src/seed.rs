use msgstats_core::AccountConfig;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// Upsert accounts from an accounts file, matching active accounts by name.
///
/// Existing active accounts get their type and credentials replaced; new
/// ones are inserted with a zeroed stats row. Returns the number of accounts
/// processed. All writes run inside a single transaction; if any operation
/// fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_accounts(pool: &PgPool, accounts: &[AccountConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for account in accounts {
        let account_id: i64 = sqlx::query_scalar(
            "INSERT INTO accounts (account_type, account_name, credentials, is_active) \
             VALUES ($1, $2, $3, true) \
             ON CONFLICT (account_name) WHERE is_active DO UPDATE SET \
                 account_type = EXCLUDED.account_type, \
                 credentials = EXCLUDED.credentials, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(account.provider_type.as_tag())
        .bind(account.name.trim())
        .bind(Json(&account.credentials))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO account_stats (account_id, refreshed_at) VALUES ($1, NOW()) \
             ON CONFLICT (account_id) DO NOTHING",
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
