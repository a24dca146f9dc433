//! WhatsApp Business (Graph API) adapter.
//!
//! Two independent calls against the phone number node:
//! `/{phone_number_id}/messages` for the total and
//! `/{phone_number_id}/conversations` for unread counters. Either may fail
//! alone; only both failing is an error.

use msgstats_core::{FetchedStats, WhatsAppCredentials};
use serde::Deserialize;

use crate::context::{build_url, Auth, ProviderContext};
use crate::error::ProviderError;
use crate::timestamps::parse_optional;

#[derive(Debug, Deserialize)]
struct Listing<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Conversation {
    #[serde(default)]
    unread_count: u64,
    updated_time: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WhatsAppAdapter {
    ctx: ProviderContext,
}

impl WhatsAppAdapter {
    #[must_use]
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    /// Counts messages and unread conversations for one phone number.
    ///
    /// # Errors
    ///
    /// Returns the conversations error when both listing calls fail, or
    /// [`ProviderError::InvalidBaseUrl`] for a bad configured base URL.
    pub async fn fetch_stats(
        &self,
        credentials: &WhatsAppCredentials,
    ) -> Result<FetchedStats, ProviderError> {
        let base = &self.ctx.endpoints().whatsapp_base_url;
        let auth = Auth::Bearer(&credentials.api_key);
        let messages_url = build_url(base, &[&credentials.phone_number_id, "messages"], &[])?;
        let conversations_url =
            build_url(base, &[&credentials.phone_number_id, "conversations"], &[])?;

        let (messages, conversations) = tokio::join!(
            self.ctx
                .get_json::<Listing<serde_json::Value>>(&messages_url, auth, "whatsapp messages"),
            self.ctx.get_json::<Listing<Conversation>>(
                &conversations_url,
                auth,
                "whatsapp conversations"
            ),
        );

        let mut stats = FetchedStats::default();

        match (messages, conversations) {
            (Err(messages_err), Err(conversations_err)) => {
                tracing::warn!(
                    waba_id = %credentials.waba_id,
                    error = %messages_err,
                    "whatsapp messages listing failed"
                );
                return Err(conversations_err);
            }
            (messages, conversations) => {
                match messages {
                    Ok(listing) => stats.total_messages = listing.data.len() as u64,
                    Err(e) => {
                        tracing::warn!(
                            waba_id = %credentials.waba_id,
                            error = %e,
                            "whatsapp messages listing failed, total left at 0"
                        );
                        stats.partial_failures.push(format!("messages: {e}"));
                    }
                }
                match conversations {
                    Ok(listing) => fold_conversations(&mut stats, &listing.data),
                    Err(e) => {
                        tracing::warn!(
                            waba_id = %credentials.waba_id,
                            error = %e,
                            "whatsapp conversations listing failed, unread left at 0"
                        );
                        stats.partial_failures.push(format!("conversations: {e}"));
                    }
                }
            }
        }

        Ok(stats)
    }
}

fn fold_conversations(stats: &mut FetchedStats, conversations: &[Conversation]) {
    for conversation in conversations {
        stats.unread_messages = stats.unread_messages.saturating_add(conversation.unread_count);
        if conversation.unread_count > 0 {
            if let Some(at) =
                parse_optional(conversation.updated_time.as_deref(), "whatsapp updated_time")
            {
                stats.observe_unread_at(at);
            }
        }
    }
}
