//! Shared HTTP plumbing for the adapters: one `reqwest::Client`, the provider
//! base URLs, and the retry policy, built once per process.

use std::time::Duration;

use msgstats_core::{AppConfig, ProviderEndpoints};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::ProviderError;
use crate::retry::retry_with_backoff;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = "msgstats/0.1 (inbox-stats)";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BACKOFF_BASE_MS: u64 = 500;
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Knobs used to build a [`ProviderContext`].
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub endpoints: ProviderEndpoints,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_base_ms: DEFAULT_RETRY_BACKOFF_BASE_MS,
            endpoints: ProviderEndpoints::default(),
        }
    }
}

impl ProviderSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.provider_request_timeout_secs,
            user_agent: config.provider_user_agent.clone(),
            max_retries: config.provider_max_retries,
            retry_backoff_base_ms: config.provider_retry_backoff_base_ms,
            endpoints: config.provider_endpoints.clone(),
        }
    }
}

/// How a data call authenticates.
#[derive(Clone, Copy)]
pub(crate) enum Auth<'a> {
    Bearer(&'a str),
    SkypeToken(&'a str),
}

impl Auth<'_> {
    fn apply(self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::SkypeToken(token) => {
                request.header("Authentication", format!("skypetoken={token}"))
            }
        }
    }
}

/// Cheaply cloneable handle every adapter holds.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    client: Client,
    max_retries: u32,
    retry_backoff_base_ms: u64,
    endpoints: ProviderEndpoints,
}

impl ProviderContext {
    /// Builds the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: settings.max_retries,
            retry_backoff_base_ms: settings.retry_backoff_base_ms,
            endpoints: settings.endpoints.clone(),
        })
    }

    #[must_use]
    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Sends an authenticated GET, retrying transient failures, and decodes
    /// the 2xx body as `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        auth: Auth<'_>,
        context: &str,
    ) -> Result<T, ProviderError> {
        retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, context, || async move {
            let request = auth.apply(self.client.get(url.clone()));
            let response = request.send().await?;
            read_json(response, context).await
        })
        .await
    }
}

/// Asserts a 2xx status and decodes the body, keeping a short excerpt of the
/// body on error statuses for the logs.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            context: context.to_owned(),
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }
    serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

/// Joins `segments` onto `base` (percent-encoding each one) and appends `query`.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidBaseUrl`] if `base` does not parse or
/// cannot carry path segments.
pub(crate) fn build_url(
    base: &str,
    segments: &[&str],
    query: &[(&str, &str)],
) -> Result<Url, ProviderError> {
    let invalid = |reason: String| ProviderError::InvalidBaseUrl {
        url: base.to_owned(),
        reason,
    };

    let mut url = Url::parse(base.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| invalid("URL cannot be a base".to_owned()))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_appends_segments_to_versioned_base() {
        let url = build_url("https://graph.facebook.com/v17.0", &["123", "messages"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://graph.facebook.com/v17.0/123/messages");
    }

    #[test]
    fn build_url_strips_trailing_slash() {
        let url = build_url("https://api.helpscout.net/v2/", &["conversations"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.helpscout.net/v2/conversations");
    }

    #[test]
    fn build_url_encodes_segments_and_query() {
        let url = build_url(
            "https://example.test/v1",
            &["conversations", "19:abc def@thread.skype"],
            &[("status", "active"), ("q", "a&b")],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v1/conversations/19:abc%20def@thread.skype?status=active&q=a%26b"
        );
    }

    #[test]
    fn build_url_rejects_invalid_base() {
        let err = build_url("not a url", &["x"], &[]).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidBaseUrl { .. }), "got {err:?}");
    }

    #[test]
    fn default_settings_match_documented_defaults() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.retry_backoff_base_ms, 500);
        assert_eq!(settings.endpoints, ProviderEndpoints::default());
    }
}
