//! Background job scheduler.
//!
//! Registers the recurring stats refresh when `MSGSTATS_REFRESH_CRON` is set.

use std::sync::Arc;

use msgstats_refresh::RefreshOrchestrator;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    orchestrator: Arc<RefreshOrchestrator>,
    refresh_cron: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match refresh_cron {
        Some(cron) => register_refresh_job(&scheduler, cron, pool, orchestrator).await?,
        None => tracing::info!("scheduler: MSGSTATS_REFRESH_CRON not set; refresh runs on demand only"),
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring refresh of every active account.
async fn register_refresh_job(
    scheduler: &JobScheduler,
    cron: &str,
    pool: PgPool,
    orchestrator: Arc<RefreshOrchestrator>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let orchestrator = Arc::clone(&orchestrator);

        Box::pin(async move {
            tracing::info!("scheduler: starting stats refresh");
            match orchestrator.refresh_all(pool.as_ref()).await {
                Ok(report) => tracing::info!(
                    accounts = report.accounts(),
                    succeeded = report.succeeded(),
                    failed = report.failed(),
                    skipped = report.skipped(),
                    "scheduler: stats refresh complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: stats refresh failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered stats refresh job");
    Ok(())
}
