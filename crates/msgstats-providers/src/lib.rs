//! Provider adapters that count messages for one account each.
//!
//! Each adapter talks HTTP to one messaging provider and returns
//! [`msgstats_core::FetchedStats`]; persistence is left to the caller.
//! [`AdapterRegistry`] maps stored provider tags to adapter constructors.

pub mod adapter;
pub(crate) mod context;
pub mod error;
pub mod helpscout;
pub mod messenger;
pub mod registry;
pub(crate) mod retry;
pub mod skype;
pub mod timestamps;
pub mod whatsapp;

pub use adapter::ProviderAdapter;
pub use context::{ProviderContext, ProviderSettings};
pub use error::ProviderError;
pub use helpscout::HelpScoutAdapter;
pub use messenger::MessengerAdapter;
pub use registry::{AdapterConstructor, AdapterRegistry};
pub use skype::SkypeAdapter;
pub use timestamps::parse_provider_timestamp;
pub use whatsapp::WhatsAppAdapter;
