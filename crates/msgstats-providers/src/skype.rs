//! Skype adapter.
//!
//! Logs in with username/password to obtain a `skypetoken`, lists recent
//! conversations, then counts each conversation's messages. Login and the
//! conversation listing are primary calls; a failing per-chat messages call
//! drops only that chat.

use msgstats_core::{FetchedStats, ProviderType, SkypeCredentials};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::context::{build_url, read_json, Auth, ProviderContext};
use crate::error::ProviderError;
use crate::timestamps::parse_optional;

const PAGE_SIZE: &str = "100";

#[derive(Deserialize)]
struct LoginResponse {
    skypetoken: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationList {
    #[serde(default)]
    conversations: Vec<Conversation>,
}

#[derive(Debug, Deserialize)]
struct Conversation {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    originalarrivaltime: Option<String>,
    composetime: Option<String>,
    read: Option<Value>,
    properties: Option<Map<String, Value>>,
}

impl Message {
    /// The explicit `read` flag wins; without it, `properties.isread` or
    /// `properties.read` decide. A message with neither is treated as read.
    fn is_unread(&self) -> bool {
        let read = self.read.as_ref().and_then(flag).or_else(|| {
            let properties = self.properties.as_ref()?;
            properties
                .get("isread")
                .or_else(|| properties.get("read"))
                .and_then(flag)
        });
        read == Some(false)
    }

    fn timestamp(&self) -> Option<&str> {
        self.originalarrivaltime
            .as_deref()
            .or(self.composetime.as_deref())
    }
}

/// Accepts JSON booleans and the `"true"`/`"false"` strings Skype sends in
/// property maps.
fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct SkypeAdapter {
    ctx: ProviderContext,
}

impl SkypeAdapter {
    #[must_use]
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    /// Counts messages and unread messages across recent chats.
    ///
    /// # Errors
    ///
    /// Returns an error when login or the conversation listing fails.
    pub async fn fetch_stats(
        &self,
        credentials: &SkypeCredentials,
    ) -> Result<FetchedStats, ProviderError> {
        let token = self.login(credentials).await?;
        let auth = Auth::SkypeToken(&token);
        let base = &self.ctx.endpoints().skype_base_url;

        let url = build_url(
            base,
            &["users", "ME", "conversations"],
            &[
                ("view", "msnp24Equivalent"),
                ("pageSize", PAGE_SIZE),
                ("startTime", "0"),
                ("targetType", "Passport|Skype|Lync|Thread"),
            ],
        )?;
        let chats: ConversationList = self.ctx.get_json(&url, auth, "skype conversations").await?;

        let mut stats = FetchedStats::default();
        for chat in &chats.conversations {
            let url = build_url(
                base,
                &["users", "ME", "conversations", &chat.id, "messages"],
                &[
                    ("view", "msnp24Equivalent"),
                    ("pageSize", PAGE_SIZE),
                    ("startTime", "0"),
                ],
            )?;
            match self
                .ctx
                .get_json::<MessageList>(&url, auth, "skype messages")
                .await
            {
                Ok(list) => fold_messages(&mut stats, &list.messages),
                Err(e) => {
                    tracing::warn!(
                        chat_id = %chat.id,
                        error = %e,
                        "skype messages listing failed, skipping chat"
                    );
                    stats.partial_failures.push(format!("chat {}: {e}", chat.id));
                }
            }
        }

        Ok(stats)
    }

    async fn login(&self, credentials: &SkypeCredentials) -> Result<String, ProviderError> {
        let response = self
            .ctx
            .client()
            .post(&self.ctx.endpoints().skype_login_url)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("scopes", "client"),
            ])
            .send()
            .await?;

        let login: LoginResponse = read_json(response, "skype login").await?;
        match login.skypetoken {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ProviderError::Auth {
                provider: ProviderType::Skype,
                reason: "login response carried no skypetoken".to_owned(),
            }),
        }
    }
}

fn fold_messages(stats: &mut FetchedStats, messages: &[Message]) {
    stats.total_messages = stats.total_messages.saturating_add(messages.len() as u64);
    for message in messages.iter().filter(|m| m.is_unread()) {
        stats.unread_messages = stats.unread_messages.saturating_add(1);
        if let Some(at) = parse_optional(message.timestamp(), "skype message time") {
            stats.observe_unread_at(at);
        }
    }
}
