//! Domain types shared by every msgstats crate.
//!
//! Holds the provider tag enum, the typed credential union and its codec,
//! the stats snapshot model, and application configuration loading.

pub mod accounts_file;
pub mod app_config;
pub mod config;
pub mod credentials;
pub mod provider;
pub mod stats;

use thiserror::Error;

pub use accounts_file::{load_accounts_file, AccountConfig, AccountsFile};
pub use app_config::{AppConfig, Environment, ProviderEndpoints};
pub use config::{load_app_config, load_app_config_from_env};
pub use credentials::{
    CredentialError, Credentials, HelpScoutCredentials, MessengerCredentials, SkypeCredentials,
    WhatsAppCredentials,
};
pub use provider::{ProviderType, UnknownProviderType};
pub use stats::{FailureReason, FetchedStats, OutcomeStatus, RefreshOutcome, StatsSnapshot};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read accounts file {path}: {source}")]
    AccountsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse accounts file: {0}")]
    AccountsFileParse(#[from] serde_yaml::Error),

    #[error("accounts file validation failed: {0}")]
    Validation(String),
}
