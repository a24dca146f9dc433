use msgstats_core::{Credentials, FetchedStats, ProviderType};

use crate::error::ProviderError;
use crate::helpscout::HelpScoutAdapter;
use crate::messenger::MessengerAdapter;
use crate::skype::SkypeAdapter;
use crate::whatsapp::WhatsAppAdapter;

/// One adapter per provider. Adding a provider means adding a variant here,
/// a [`Credentials`] variant, and a registry entry.
#[derive(Debug, Clone)]
pub enum ProviderAdapter {
    WhatsApp(WhatsAppAdapter),
    Skype(SkypeAdapter),
    Messenger(MessengerAdapter),
    HelpScout(HelpScoutAdapter),
}

impl ProviderAdapter {
    #[must_use]
    pub fn provider_type(&self) -> ProviderType {
        match self {
            Self::WhatsApp(_) => ProviderType::WhatsApp,
            Self::Skype(_) => ProviderType::Skype,
            Self::Messenger(_) => ProviderType::Messenger,
            Self::HelpScout(_) => ProviderType::HelpScout,
        }
    }

    /// Fetches `(total, unread, oldest_unread_at)` for one account.
    ///
    /// Sub-call failures that still leave a usable result are returned in
    /// [`FetchedStats::partial_failures`] rather than as an error.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::CredentialMismatch`] if `credentials` belong to
    ///   another provider.
    /// - Any [`ProviderError`] from the adapter's primary calls.
    pub async fn fetch_stats(
        &self,
        credentials: &Credentials,
    ) -> Result<FetchedStats, ProviderError> {
        match (self, credentials) {
            (Self::WhatsApp(adapter), Credentials::WhatsApp(c)) => adapter.fetch_stats(c).await,
            (Self::Skype(adapter), Credentials::Skype(c)) => adapter.fetch_stats(c).await,
            (Self::Messenger(adapter), Credentials::Messenger(c)) => adapter.fetch_stats(c).await,
            (Self::HelpScout(adapter), Credentials::HelpScout(c)) => adapter.fetch_stats(c).await,
            _ => Err(ProviderError::CredentialMismatch {
                adapter: self.provider_type(),
                found: credentials.provider_type(),
            }),
        }
    }
}
