//! One refresh cycle: load, plan, fan out, persist, report.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use msgstats_core::{
    AppConfig, Credentials, FailureReason, FetchedStats, OutcomeStatus, ProviderType,
    RefreshOutcome, StatsSnapshot,
};
use msgstats_db::DbError;
use msgstats_providers::{
    AdapterRegistry, ProviderAdapter, ProviderContext, ProviderError, ProviderSettings,
};
use thiserror::Error;

use crate::store::{AccountSource, ActiveAccount, SnapshotStore};

const DEFAULT_MAX_CONCURRENT: usize = 16;
const DEFAULT_TASK_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum RefreshError {
    /// The account list could not be read; nothing was dispatched.
    #[error("failed to load active accounts: {0}")]
    Load(#[source] DbError),
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshSettings {
    /// Upper bound on fetch tasks in flight at once.
    pub max_concurrent: usize,
    /// Wall-clock budget for one account's fetch.
    pub task_timeout: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            task_timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS),
        }
    }
}

impl RefreshSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_concurrent: config.refresh_max_concurrent,
            task_timeout: Duration::from_secs(config.refresh_task_timeout_secs),
        }
    }
}

/// Per-account outcomes of one completed cycle, ordered by account id.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcomes: Vec<RefreshOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CycleReport {
    #[must_use]
    pub fn accounts(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Accounts skipped without a write because no adapter handles their type.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| is_skip(&o.status))
            .count()
    }

    /// Accounts whose refresh failed after planning; each got a zeroed row
    /// unless the write itself failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.accounts() - self.succeeded() - self.skipped()
    }

    #[must_use]
    pub fn outcome(&self, account_id: i64) -> Option<&RefreshOutcome> {
        self.outcomes.iter().find(|o| o.account_id == account_id)
    }
}

fn is_skip(status: &OutcomeStatus) -> bool {
    matches!(
        status,
        OutcomeStatus::Failure(FailureReason::UnknownProvider(_))
    )
}

/// Work for one account that passed the registry lookup.
enum Task {
    Fetch {
        account_id: i64,
        provider_type: ProviderType,
        adapter: ProviderAdapter,
        credentials: Credentials,
    },
    /// Planning already failed; only the zeroed row remains to be written.
    Failed {
        account_id: i64,
        reason: FailureReason,
    },
}

pub struct RefreshOrchestrator {
    registry: AdapterRegistry,
    ctx: ProviderContext,
    settings: RefreshSettings,
}

impl RefreshOrchestrator {
    #[must_use]
    pub fn new(registry: AdapterRegistry, ctx: ProviderContext, settings: RefreshSettings) -> Self {
        Self {
            registry,
            ctx,
            settings,
        }
    }

    /// Standard registry and HTTP context built from application config.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let ctx = ProviderContext::new(&ProviderSettings::from_app_config(config))?;
        Ok(Self::new(
            AdapterRegistry::standard(),
            ctx,
            RefreshSettings::from_app_config(config),
        ))
    }

    #[must_use]
    pub fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    /// Refreshes every active account once.
    ///
    /// Per-account failures never fail the cycle: they become outcomes in the
    /// report and, except for unknown provider types, a zeroed snapshot.
    /// Returns only after every dispatched task has finished or timed out.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::Load`] if the account list cannot be read.
    pub async fn refresh_all<S>(&self, store: &S) -> Result<CycleReport, RefreshError>
    where
        S: AccountSource + SnapshotStore,
    {
        let started_at = Utc::now();
        let accounts = store
            .load_active_accounts()
            .await
            .map_err(RefreshError::Load)?;

        if accounts.is_empty() {
            tracing::info!("no active accounts, nothing to refresh");
            return Ok(CycleReport {
                outcomes: Vec::new(),
                started_at,
                finished_at: Utc::now(),
            });
        }

        let account_count = accounts.len();
        let mut outcomes = Vec::with_capacity(account_count);
        let mut tasks = Vec::with_capacity(account_count);
        for account in accounts {
            match self.plan(account) {
                Ok(task) => tasks.push(task),
                Err(skipped) => outcomes.push(skipped),
            }
        }

        let max_concurrent = self.settings.max_concurrent.max(1);
        let completed: Vec<RefreshOutcome> = stream::iter(tasks)
            .map(|task| self.run_task(store, task))
            .buffer_unordered(max_concurrent)
            .collect()
            .await;
        outcomes.extend(completed);
        outcomes.sort_by_key(|o| o.account_id);

        let report = CycleReport {
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            accounts = report.accounts(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "refresh cycle complete"
        );
        Ok(report)
    }

    /// Resolves the adapter and decodes credentials. `Err` is a skip: no task
    /// and no write.
    fn plan(&self, account: ActiveAccount) -> Result<Task, RefreshOutcome> {
        let Some(constructor) = self.registry.resolve(&account.provider_tag) else {
            tracing::warn!(
                account_id = account.id,
                provider = %account.provider_tag,
                "no adapter registered for provider type, skipping account"
            );
            return Err(RefreshOutcome::failure(
                account.id,
                FailureReason::UnknownProvider(account.provider_tag),
            ));
        };

        let provider_type = constructor.provider_type();
        match Credentials::decode(provider_type, &account.credentials) {
            Ok(credentials) => Ok(Task::Fetch {
                account_id: account.id,
                provider_type,
                adapter: constructor.construct(&self.ctx),
                credentials,
            }),
            Err(e) => {
                tracing::warn!(
                    account_id = account.id,
                    provider = %provider_type,
                    error = %e,
                    "credential decode failed"
                );
                Ok(Task::Failed {
                    account_id: account.id,
                    reason: FailureReason::Credentials(e.to_string()),
                })
            }
        }
    }

    /// Runs one task to completion and writes exactly one snapshot for it.
    async fn run_task<S: SnapshotStore>(&self, store: &S, task: Task) -> RefreshOutcome {
        let (account_id, result) = match task {
            Task::Fetch {
                account_id,
                provider_type,
                adapter,
                credentials,
            } => {
                let result = self
                    .fetch_with_timeout(account_id, provider_type, &adapter, &credentials)
                    .await;
                (account_id, result)
            }
            Task::Failed { account_id, reason } => (account_id, Err(reason)),
        };

        let refreshed_at = Utc::now();
        let snapshot = match &result {
            Ok(fetched) => StatsSnapshot::from_fetched(account_id, fetched, refreshed_at),
            Err(reason) => StatsSnapshot::zeroed(account_id, reason, refreshed_at),
        };

        if let Err(e) = store.upsert_snapshot(&snapshot).await {
            let refresh_error = result.as_ref().err().map(ToString::to_string);
            tracing::error!(
                account_id,
                error = %e,
                refresh_error = refresh_error.as_deref().unwrap_or("none"),
                "failed to write stats snapshot"
            );
            let detail = match refresh_error {
                Some(prior) => format!("{e} (after {prior})"),
                None => e.to_string(),
            };
            return RefreshOutcome::failure(account_id, FailureReason::Storage(detail));
        }

        match result {
            Ok(_) => RefreshOutcome::success(account_id),
            Err(reason) => RefreshOutcome::failure(account_id, reason),
        }
    }

    async fn fetch_with_timeout(
        &self,
        account_id: i64,
        provider_type: ProviderType,
        adapter: &ProviderAdapter,
        credentials: &Credentials,
    ) -> Result<FetchedStats, FailureReason> {
        let timeout = self.settings.task_timeout;
        let fetch = AssertUnwindSafe(adapter.fetch_stats(credentials)).catch_unwind();
        match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(Ok(fetched))) => {
                if fetched.unread_messages > fetched.total_messages {
                    tracing::warn!(
                        account_id,
                        provider = %provider_type,
                        total = fetched.total_messages,
                        unread = fetched.unread_messages,
                        "provider reported more unread than total messages"
                    );
                }
                if fetched.is_degraded() {
                    tracing::warn!(
                        account_id,
                        provider = %provider_type,
                        partial_failures = fetched.partial_failures.len(),
                        "stats fetched with partial failures"
                    );
                } else {
                    tracing::debug!(
                        account_id,
                        provider = %provider_type,
                        total = fetched.total_messages,
                        unread = fetched.unread_messages,
                        "stats fetched"
                    );
                }
                Ok(fetched)
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(
                    account_id,
                    provider = %provider_type,
                    error = %e,
                    "provider fetch failed"
                );
                Err(FailureReason::Fetch(e.to_string()))
            }
            Ok(Err(_panic)) => {
                tracing::error!(
                    account_id,
                    provider = %provider_type,
                    "provider adapter panicked during fetch"
                );
                Err(FailureReason::Fetch("adapter panicked".to_owned()))
            }
            Err(_) => {
                tracing::warn!(
                    account_id,
                    provider = %provider_type,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "provider fetch timed out"
                );
                Err(FailureReason::Timeout {
                    secs: timeout.as_secs(),
                })
            }
        }
    }
}
