use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The messaging ecosystems msgstats knows how to poll.
///
/// The string tag (`"WhatsApp"`, `"Skype"`, ...) is what the `accounts`
/// table stores in `account_type`; it is matched exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderType {
    WhatsApp,
    Skype,
    Messenger,
    HelpScout,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider type '{0}'")]
pub struct UnknownProviderType(pub String);

impl ProviderType {
    pub const ALL: [ProviderType; 4] = [
        ProviderType::WhatsApp,
        ProviderType::Skype,
        ProviderType::Messenger,
        ProviderType::HelpScout,
    ];

    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            ProviderType::WhatsApp => "WhatsApp",
            ProviderType::Skype => "Skype",
            ProviderType::Messenger => "Messenger",
            ProviderType::HelpScout => "HelpScout",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_tag() == tag)
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for ProviderType {
    type Err = UnknownProviderType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownProviderType(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_tag() {
        for provider in ProviderType::ALL {
            assert_eq!(ProviderType::from_tag(provider.as_tag()), Some(provider));
        }
    }

    #[test]
    fn from_tag_is_exact_match() {
        assert_eq!(ProviderType::from_tag("whatsapp"), None);
        assert_eq!(ProviderType::from_tag("Telegram"), None);
    }

    #[test]
    fn from_str_reports_the_unknown_tag() {
        let err = "Telegram".parse::<ProviderType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown provider type 'Telegram'");
    }

    #[test]
    fn serde_uses_the_tag() {
        let json = serde_json::to_string(&ProviderType::HelpScout).expect("serialize");
        assert_eq!(json, "\"HelpScout\"");
    }
}
