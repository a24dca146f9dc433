//! Stats read surface and the on-demand refresh trigger.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use msgstats_refresh::CycleReport;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(in crate::api) struct StatsItem {
    pub account_id: i64,
    pub account_name: String,
    pub account_type: String,
    pub total_messages: i64,
    pub unread_messages: i64,
    pub oldest_unread_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub refreshed_at: DateTime<Utc>,
}

impl From<msgstats_db::StatsRow> for StatsItem {
    fn from(row: msgstats_db::StatsRow) -> Self {
        Self {
            account_id: row.account_id,
            account_name: row.account_name,
            account_type: row.account_type,
            total_messages: row.total_messages,
            unread_messages: row.unread_messages,
            oldest_unread_at: row.oldest_unread_at,
            last_error: row.last_error,
            refreshed_at: row.refreshed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct RefreshSummary {
    pub cycle_status: &'static str,
    pub accounts: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl From<&CycleReport> for RefreshSummary {
    fn from(report: &CycleReport) -> Self {
        Self {
            cycle_status: "ok",
            accounts: report.accounts(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            skipped: report.skipped(),
            started_at: report.started_at,
            finished_at: report.finished_at,
        }
    }
}

/// GET /api/v1/stats: current snapshot of every active account.
pub(in crate::api) async fn list_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<StatsItem>>>, ApiError> {
    let rows = msgstats_db::list_stats(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(StatsItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/stats/refresh: run one refresh cycle and wait for it.
///
/// Per-account failures are reported in the counts; only a failure to load
/// the account list fails the request.
pub(in crate::api) async fn refresh_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<RefreshSummary>>, ApiError> {
    let report = state
        .orchestrator
        .refresh_all(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "on-demand refresh failed");
            ApiError::new(req_id.0.clone(), "refresh_failed", "refresh cycle failed")
        })?;

    Ok(Json(ApiResponse {
        data: RefreshSummary::from(&report),
        meta: ResponseMeta::new(req_id.0),
    }))
}
