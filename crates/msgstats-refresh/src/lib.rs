//! The refresh engine: loads active accounts, fetches stats for each through
//! its provider adapter concurrently, and writes one snapshot per account.

pub mod orchestrator;
pub mod store;

pub use orchestrator::{CycleReport, RefreshError, RefreshOrchestrator, RefreshSettings};
pub use store::{AccountSource, ActiveAccount, SnapshotStore};
