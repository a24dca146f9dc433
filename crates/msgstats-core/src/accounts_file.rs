//! YAML file listing accounts to register, used by `msgstats-cli accounts import`.
//!
//! ```yaml
//! accounts:
//!   - name: Support desk
//!     type: HelpScout
//!     credentials:
//!       client_id: abc
//!       client_secret: xyz
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::credentials::Credentials;
use crate::provider::ProviderType;
use crate::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    pub credentials: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct AccountsFile {
    pub accounts: Vec<AccountConfig>,
}

/// Load and validate an accounts file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation
/// (blank or duplicate names, credentials that do not decode for their type).
pub fn load_accounts_file(path: &Path) -> Result<AccountsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AccountsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_accounts_file(&content)
}

fn parse_accounts_file(content: &str) -> Result<AccountsFile, ConfigError> {
    let file: AccountsFile = serde_yaml::from_str(content)?;
    validate_accounts(&file)?;
    Ok(file)
}

fn validate_accounts(file: &AccountsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for account in &file.accounts {
        let name = account.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "account name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate account name: '{name}'"
            )));
        }

        Credentials::decode(account.provider_type, &account.credentials).map_err(|e| {
            ConfigError::Validation(format!("account '{name}': {e}"))
        })?;
    }

    Ok(())
}
