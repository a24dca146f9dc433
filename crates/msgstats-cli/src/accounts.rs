//! Account registration command handlers for the CLI.
//!
//! Credentials pass through the provider codec before anything is written,
//! so a typo in a field name fails here instead of during the next refresh.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use msgstats_core::{Credentials, ProviderType};

/// Sub-commands available under `accounts`.
#[derive(Debug, Subcommand)]
pub enum AccountsCommands {
    /// List active accounts
    List,
    /// Register a new account
    Add {
        /// Provider type tag (WhatsApp, Skype, Messenger, HelpScout)
        #[arg(long = "type")]
        provider_type: String,
        /// Display name; must be unique among active accounts
        #[arg(long)]
        name: String,
        /// Credentials as a JSON object, e.g. '{"access_token":"..."}'
        #[arg(long)]
        credentials: String,
    },
    /// Soft-delete an account by id
    Deactivate { id: i64 },
    /// Upsert accounts from a YAML accounts file, matched by name
    Import {
        /// Path to the accounts file (defaults to `MSGSTATS_ACCOUNTS_PATH`)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Parse and validate the `accounts add` arguments into an insertable account.
fn build_new_account(
    provider_type: &str,
    name: &str,
    credentials: &str,
) -> anyhow::Result<msgstats_db::NewAccount> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("account name must be non-empty");
    }

    let provider_type: ProviderType = provider_type.parse()?;
    let credentials = Credentials::decode_str(provider_type, credentials)?;

    Ok(msgstats_db::NewAccount {
        name: name.to_owned(),
        credentials,
    })
}

/// Print all active accounts. Credentials are never shown.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_accounts_list(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let accounts = msgstats_db::list_active_accounts(pool).await?;

    if accounts.is_empty() {
        println!("no active accounts; add one with `accounts add` or `accounts import`");
        return Ok(());
    }

    println!("{:<8}{:<12}{:<18}NAME", "ID", "TYPE", "CREATED");
    for account in &accounts {
        println!(
            "{:<8}{:<12}{:<18}{}",
            account.id,
            account.account_type,
            super::fmt_time(Some(account.created_at)),
            account.account_name
        );
    }

    Ok(())
}

/// Register one account with a zeroed stats snapshot.
///
/// # Errors
///
/// Returns an error if the provider type is unknown, the credentials do not
/// decode for it, or the insert fails (including a duplicate active name).
pub(crate) async fn run_accounts_add(
    pool: &sqlx::PgPool,
    provider_type: &str,
    name: &str,
    credentials: &str,
) -> anyhow::Result<()> {
    let new_account = build_new_account(provider_type, name, credentials)?;
    let row = msgstats_db::create_account(pool, &new_account).await?;

    tracing::info!(account_id = row.id, provider = %row.account_type, "account created");
    println!("created account {} ({})", row.id, row.account_name);
    Ok(())
}

/// Soft-delete one account.
///
/// # Errors
///
/// Returns an error if no active account has this id or the update fails.
pub(crate) async fn run_accounts_deactivate(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<()> {
    match msgstats_db::deactivate_account(pool, id).await {
        Ok(()) => {
            println!("deactivated account {id}");
            Ok(())
        }
        Err(msgstats_db::DbError::NotFound) => anyhow::bail!("no active account with id {id}"),
        Err(e) => Err(e.into()),
    }
}

/// Upsert every account listed in a YAML accounts file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or any write
/// fails (the whole import is rolled back).
pub(crate) async fn run_accounts_import(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let file = msgstats_core::load_accounts_file(path)?;

    if file.accounts.is_empty() {
        println!("{} lists no accounts; nothing to import", path.display());
        return Ok(());
    }

    let count = msgstats_db::seed_accounts(pool, &file.accounts).await?;
    tracing::info!(count, path = %path.display(), "accounts imported");
    println!("imported {count} account(s) from {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_new_account_decodes_credentials() {
        let account = build_new_account(
            "HelpScout",
            " Support desk ",
            r#"{"client_id":"abc","client_secret":"xyz"}"#,
        )
        .expect("valid account");

        assert_eq!(account.name, "Support desk");
        assert_eq!(account.provider_type(), ProviderType::HelpScout);
    }

    #[test]
    fn build_new_account_rejects_unknown_type() {
        let err = build_new_account("Telegram", "Chat", "{}").unwrap_err();
        assert!(err.to_string().contains("Telegram"), "{err}");
    }

    #[test]
    fn build_new_account_rejects_missing_fields() {
        let err = build_new_account("Skype", "Personal", r#"{"username":"alice"}"#).unwrap_err();
        assert!(err.to_string().contains("password"), "{err}");
    }

    #[test]
    fn build_new_account_rejects_malformed_json() {
        let err = build_new_account("Messenger", "Page", "{not json").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"), "{err}");
    }

    #[test]
    fn build_new_account_rejects_blank_name() {
        let err =
            build_new_account("Messenger", "  ", r#"{"access_token":"t"}"#).unwrap_err();
        assert!(err.to_string().contains("non-empty"), "{err}");
    }
}
