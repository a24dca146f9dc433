use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Base URLs for each provider API. Overridable so tests and staging setups
/// can point adapters at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub whatsapp_base_url: String,
    pub messenger_base_url: String,
    pub skype_base_url: String,
    pub skype_login_url: String,
    pub helpscout_base_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            whatsapp_base_url: "https://graph.facebook.com/v17.0".to_string(),
            messenger_base_url: "https://graph.facebook.com/v17.0".to_string(),
            skype_base_url: "https://client-s.gateway.messenger.live.com/v1".to_string(),
            skype_login_url: "https://edge.skype.com/rps/v1/rps/skypetoken".to_string(),
            helpscout_base_url: "https://api.helpscout.net/v2".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub accounts_path: PathBuf,
    pub api_keys: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub provider_request_timeout_secs: u64,
    pub provider_user_agent: String,
    pub provider_max_retries: u32,
    pub provider_retry_backoff_base_ms: u64,
    pub provider_endpoints: ProviderEndpoints,
    pub refresh_max_concurrent: usize,
    pub refresh_task_timeout_secs: u64,
    pub refresh_cron: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("accounts_path", &self.accounts_path)
            .field("database_url", &"[redacted]")
            .field("api_keys", &self.api_keys.as_ref().map(|_| "[redacted]"))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "provider_request_timeout_secs",
                &self.provider_request_timeout_secs,
            )
            .field("provider_user_agent", &self.provider_user_agent)
            .field("provider_max_retries", &self.provider_max_retries)
            .field(
                "provider_retry_backoff_base_ms",
                &self.provider_retry_backoff_base_ms,
            )
            .field("provider_endpoints", &self.provider_endpoints)
            .field("refresh_max_concurrent", &self.refresh_max_concurrent)
            .field("refresh_task_timeout_secs", &self.refresh_task_timeout_secs)
            .field("refresh_cron", &self.refresh_cron)
            .finish()
    }
}
