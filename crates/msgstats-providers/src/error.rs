use msgstats_core::ProviderType;
use thiserror::Error;

/// Errors returned by provider adapters.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("{context} returned HTTP {status}: {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Login or token exchange succeeded at the HTTP level but yielded no usable token.
    #[error("{provider} authentication failed: {reason}")]
    Auth {
        provider: ProviderType,
        reason: String,
    },

    /// A configured base URL does not parse.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The adapter was handed credentials for another provider.
    #[error("{adapter} adapter cannot use {found} credentials")]
    CredentialMismatch {
        adapter: ProviderType,
        found: ProviderType,
    },
}

impl ProviderError {
    /// HTTP status carried by the error, if the provider answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            ProviderError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
