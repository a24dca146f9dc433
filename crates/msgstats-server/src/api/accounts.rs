//! Account registration handlers: list, create, get, deactivate.
//!
//! Credentials are accepted on create and validated against the provider's
//! codec, but never returned.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use msgstats_core::{Credentials, ProviderType};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateAccountRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub credentials: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct AccountItem {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<msgstats_db::AccountRow> for AccountItem {
    fn from(row: msgstats_db::AccountRow) -> Self {
        Self {
            id: row.id,
            name: row.account_name,
            provider_type: row.account_type,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_create(rid: &str, body: &CreateAccountRequest) -> Result<msgstats_db::NewAccount, ApiError> {
    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > 200 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "name must be 1-200 characters",
        ));
    }

    let provider_type: ProviderType = body
        .provider_type
        .parse()
        .map_err(|e: msgstats_core::UnknownProviderType| {
            ApiError::new(rid, "validation_error", e.to_string())
        })?;

    let credentials = Credentials::decode(provider_type, &body.credentials)
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;

    Ok(msgstats_db::NewAccount {
        name: name.to_owned(),
        credentials,
    })
}

fn map_unique_violation(req_id: &str, e: &msgstats_db::DbError) -> ApiError {
    if let msgstats_db::DbError::Sqlx(sqlx::Error::Database(db_err)) = e {
        if db_err.code().as_deref() == Some("23505") {
            return ApiError::new(
                req_id,
                "conflict",
                "an active account with that name already exists",
            );
        }
    }
    map_db_error(req_id.to_owned(), e)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/accounts: active accounts, ordered by id.
pub(in crate::api) async fn list_accounts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<AccountItem>>>, ApiError> {
    let rows = msgstats_db::list_active_accounts(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(AccountItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/accounts: register an account with a zeroed snapshot.
pub(in crate::api) async fn create_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountItem>>), ApiError> {
    let rid = &req_id.0;
    let new_account = validate_create(rid, &body)?;

    let row = msgstats_db::create_account(&state.pool, &new_account)
        .await
        .map_err(|e| map_unique_violation(rid, &e))?;

    tracing::info!(
        account_id = row.id,
        provider = %new_account.provider_type(),
        "account created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: AccountItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/accounts/:id: one account, active or not.
pub(in crate::api) async fn get_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AccountItem>>, ApiError> {
    let row = msgstats_db::get_account(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "account not found"))?;

    Ok(Json(ApiResponse {
        data: AccountItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/accounts/:id: soft-delete an account.
pub(in crate::api) async fn deactivate_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    msgstats_db::deactivate_account(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(account_id = id, "account deactivated");

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deactivated": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
