//! Facebook Messenger (Graph API) adapter.
//!
//! Lists `me/conversations`, then each conversation's messages. The
//! conversation listing is the primary call; a failing per-conversation
//! messages call drops only that conversation.

use msgstats_core::{FetchedStats, MessengerCredentials};
use serde::Deserialize;

use crate::context::{build_url, Auth, ProviderContext};
use crate::error::ProviderError;
use crate::timestamps::parse_optional;

const CONVERSATION_FIELDS: &str = "participants,unread_count,updated_time";
const MESSAGE_FIELDS: &str = "created_time,seen";

#[derive(Debug, Deserialize)]
struct Listing<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Conversation {
    id: String,
    #[serde(default)]
    unread_count: u64,
}

#[derive(Debug, Deserialize)]
struct Message {
    created_time: Option<String>,
    #[serde(default)]
    seen: bool,
}

#[derive(Debug, Clone)]
pub struct MessengerAdapter {
    ctx: ProviderContext,
}

impl MessengerAdapter {
    #[must_use]
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    /// Counts messages and unread messages across the page's conversations.
    ///
    /// # Errors
    ///
    /// Returns an error when the conversation listing itself fails.
    pub async fn fetch_stats(
        &self,
        credentials: &MessengerCredentials,
    ) -> Result<FetchedStats, ProviderError> {
        let base = &self.ctx.endpoints().messenger_base_url;
        let auth = Auth::Bearer(&credentials.access_token);

        let url = build_url(base, &["me", "conversations"], &[("fields", CONVERSATION_FIELDS)])?;
        let conversations: Listing<Conversation> = self
            .ctx
            .get_json(&url, auth, "messenger conversations")
            .await?;

        let mut stats = FetchedStats::default();
        for conversation in &conversations.data {
            let url = build_url(
                base,
                &[&conversation.id, "messages"],
                &[("fields", MESSAGE_FIELDS)],
            )?;
            match self
                .ctx
                .get_json::<Listing<Message>>(&url, auth, "messenger messages")
                .await
            {
                Ok(messages) => fold_conversation(&mut stats, conversation, &messages.data),
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %conversation.id,
                        error = %e,
                        "messenger messages listing failed, skipping conversation"
                    );
                    stats
                        .partial_failures
                        .push(format!("conversation {}: {e}", conversation.id));
                }
            }
        }

        Ok(stats)
    }
}

fn fold_conversation(stats: &mut FetchedStats, conversation: &Conversation, messages: &[Message]) {
    stats.total_messages = stats.total_messages.saturating_add(messages.len() as u64);
    stats.unread_messages = stats.unread_messages.saturating_add(conversation.unread_count);
    if conversation.unread_count == 0 {
        return;
    }
    for message in messages.iter().filter(|m| !m.seen) {
        if let Some(at) = parse_optional(message.created_time.as_deref(), "messenger created_time")
        {
            stats.observe_unread_at(at);
        }
    }
}
