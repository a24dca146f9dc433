//! Stats command handlers: one-shot refresh and the snapshot table.

use msgstats_core::OutcomeStatus;
use msgstats_refresh::{CycleReport, RefreshOrchestrator};

/// Run one refresh cycle and print its summary.
///
/// Per-account failures are listed but do not make the command fail; only a
/// failure to build the HTTP client or load the account list does.
///
/// # Errors
///
/// Returns an error if the orchestrator cannot be built or the account list
/// cannot be loaded.
pub(crate) async fn run_refresh(
    pool: &sqlx::PgPool,
    config: &msgstats_core::AppConfig,
) -> anyhow::Result<()> {
    let orchestrator = RefreshOrchestrator::from_app_config(config)?;
    let report = orchestrator.refresh_all(pool).await?;

    for line in summary_lines(&report) {
        println!("{line}");
    }
    Ok(())
}

fn summary_lines(report: &CycleReport) -> Vec<String> {
    let elapsed_ms = (report.finished_at - report.started_at).num_milliseconds();
    let mut lines = vec![format!(
        "refreshed {} account(s) in {elapsed_ms}ms: {} succeeded, {} failed, {} skipped",
        report.accounts(),
        report.succeeded(),
        report.failed(),
        report.skipped()
    )];

    for outcome in &report.outcomes {
        if let OutcomeStatus::Failure(reason) = &outcome.status {
            lines.push(format!("  account {}: {reason}", outcome.account_id));
        }
    }

    lines
}

/// Print the current snapshot of every active account.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_stats(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let rows = msgstats_db::list_stats(pool).await?;

    if rows.is_empty() {
        println!("no active accounts");
        return Ok(());
    }

    println!(
        "{:<8}{:<12}{:<10}{:<10}{:<18}{:<18}{:<18}ACCOUNT",
        "ID", "TYPE", "TOTAL", "UNREAD", "OLDEST UNREAD", "REFRESHED", "ERROR"
    );
    for row in &rows {
        println!(
            "{:<8}{:<12}{:<10}{:<10}{:<18}{:<18}{:<18}{}",
            row.account_id,
            row.account_type,
            row.total_messages,
            row.unread_messages,
            super::fmt_time(row.oldest_unread_at),
            super::fmt_time(Some(row.refreshed_at)),
            row.last_error.as_deref().unwrap_or("-"),
            row.account_name
        );
    }

    Ok(())
}
