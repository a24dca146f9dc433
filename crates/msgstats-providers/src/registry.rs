//! Lookup from a stored provider tag to the function that builds its adapter.

use std::collections::HashMap;

use msgstats_core::ProviderType;

use crate::adapter::ProviderAdapter;
use crate::context::ProviderContext;
use crate::helpscout::HelpScoutAdapter;
use crate::messenger::MessengerAdapter;
use crate::skype::SkypeAdapter;
use crate::whatsapp::WhatsAppAdapter;

/// Builds one adapter for a provider over the shared HTTP context.
#[derive(Debug, Clone, Copy)]
pub struct AdapterConstructor {
    provider_type: ProviderType,
    build: fn(&ProviderContext) -> ProviderAdapter,
}

impl AdapterConstructor {
    #[must_use]
    pub fn new(provider_type: ProviderType, build: fn(&ProviderContext) -> ProviderAdapter) -> Self {
        Self {
            provider_type,
            build,
        }
    }

    /// The standard constructor for `provider_type`.
    #[must_use]
    pub fn standard(provider_type: ProviderType) -> Self {
        let build: fn(&ProviderContext) -> ProviderAdapter = match provider_type {
            ProviderType::WhatsApp => |ctx| ProviderAdapter::WhatsApp(WhatsAppAdapter::new(ctx.clone())),
            ProviderType::Skype => |ctx| ProviderAdapter::Skype(SkypeAdapter::new(ctx.clone())),
            ProviderType::Messenger => {
                |ctx| ProviderAdapter::Messenger(MessengerAdapter::new(ctx.clone()))
            }
            ProviderType::HelpScout => {
                |ctx| ProviderAdapter::HelpScout(HelpScoutAdapter::new(ctx.clone()))
            }
        };
        Self::new(provider_type, build)
    }

    /// Provider whose credential shape the built adapter expects.
    #[must_use]
    pub fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    #[must_use]
    pub fn construct(&self, ctx: &ProviderContext) -> ProviderAdapter {
        (self.build)(ctx)
    }
}

/// Tag → constructor table. Tags match exactly, as stored in
/// `accounts.account_type`.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    entries: HashMap<String, AdapterConstructor>,
}

impl AdapterRegistry {
    /// Registry with one entry per [`ProviderType`], keyed by its canonical tag.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::default();
        for provider_type in ProviderType::ALL {
            registry.register(provider_type.as_tag(), AdapterConstructor::standard(provider_type));
        }
        registry
    }

    /// Adds or replaces the constructor for `tag`.
    pub fn register(&mut self, tag: impl Into<String>, constructor: AdapterConstructor) {
        self.entries.insert(tag.into(), constructor);
    }

    /// Returns the constructor for `tag`, or `None` when no adapter handles it.
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<AdapterConstructor> {
        self.entries.get(tag).copied()
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}
