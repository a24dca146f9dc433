//! Help Scout Mailbox API adapter.
//!
//! Exchanges the app's client credentials for a bearer token, then pages
//! through active conversations with their threads embedded. A conversation
//! is unread when any of its threads has `seenByAgent == false`.

use msgstats_core::{FetchedStats, HelpScoutCredentials, ProviderType};
use serde::Deserialize;

use crate::context::{build_url, read_json, Auth, ProviderContext};
use crate::error::ProviderError;
use crate::timestamps::parse_optional;

/// Upper bound on pages walked per fetch.
const MAX_PAGES: u32 = 200;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationPage {
    #[serde(rename = "_embedded", default)]
    embedded: EmbeddedConversations,
    page: Option<PageInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedConversations {
    #[serde(default)]
    conversations: Vec<Conversation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct Conversation {
    #[serde(rename = "_embedded", default)]
    embedded: EmbeddedThreads,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedThreads {
    #[serde(default)]
    threads: Vec<Thread>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Thread {
    seen_by_agent: Option<bool>,
    created_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HelpScoutAdapter {
    ctx: ProviderContext,
}

impl HelpScoutAdapter {
    #[must_use]
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    /// Counts threads and unread conversations across all active conversations.
    ///
    /// # Errors
    ///
    /// Returns an error when the token exchange or the first conversations
    /// page fails. A failure on a later page ends pagination and is reported
    /// as a partial failure.
    pub async fn fetch_stats(
        &self,
        credentials: &HelpScoutCredentials,
    ) -> Result<FetchedStats, ProviderError> {
        let token = self.fetch_token(credentials).await?;
        let auth = Auth::Bearer(&token);
        let base = &self.ctx.endpoints().helpscout_base_url;

        let mut stats = FetchedStats::default();
        let mut page = 1u32;
        loop {
            let page_param = page.to_string();
            let url = build_url(
                base,
                &["conversations"],
                &[
                    ("status", "active"),
                    ("embed", "threads"),
                    ("page", &page_param),
                ],
            )?;

            let body = match self
                .ctx
                .get_json::<ConversationPage>(&url, auth, "helpscout conversations")
                .await
            {
                Ok(body) => body,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    tracing::warn!(page, error = %e, "helpscout page failed, stopping pagination");
                    stats.partial_failures.push(format!("page {page}: {e}"));
                    break;
                }
            };

            fold_conversations(&mut stats, &body.embedded.conversations);

            let total_pages = body.page.map_or(1, |p| p.total_pages);
            if page >= total_pages || body.embedded.conversations.is_empty() {
                break;
            }
            if page >= MAX_PAGES {
                tracing::warn!(total_pages, "helpscout page cap reached, counts are truncated");
                stats
                    .partial_failures
                    .push(format!("stopped after {MAX_PAGES} of {total_pages} pages"));
                break;
            }
            page += 1;
        }

        Ok(stats)
    }

    async fn fetch_token(&self, credentials: &HelpScoutCredentials) -> Result<String, ProviderError> {
        let url = build_url(&self.ctx.endpoints().helpscout_base_url, &["oauth2", "token"], &[])?;
        let response = self
            .ctx
            .client()
            .post(url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: TokenResponse = read_json(response, "helpscout token exchange").await?;
        match token.access_token {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ProviderError::Auth {
                provider: ProviderType::HelpScout,
                reason: "token response carried no access_token".to_owned(),
            }),
        }
    }
}

fn fold_conversations(stats: &mut FetchedStats, conversations: &[Conversation]) {
    for conversation in conversations {
        let threads = &conversation.embedded.threads;
        stats.total_messages = stats.total_messages.saturating_add(threads.len() as u64);

        let mut unread = false;
        for thread in threads.iter().filter(|t| t.seen_by_agent == Some(false)) {
            unread = true;
            if let Some(at) = parse_optional(thread.created_at.as_deref(), "helpscout createdAt") {
                stats.observe_unread_at(at);
            }
        }
        if unread {
            stats.unread_messages = stats.unread_messages.saturating_add(1);
        }
    }
}
