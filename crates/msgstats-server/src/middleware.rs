use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id carried in request extensions and echoed on the response.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer tokens accepted on `/api/v1/*` routes other than health.
///
/// `None` leaves the API open, which is only allowed in development.
#[derive(Clone)]
pub struct BearerAuth {
    keys: Option<Arc<[String]>>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let configured = self.keys.as_ref().map_or(0, |keys| keys.len());
        f.debug_struct("BearerAuth")
            .field("configured_keys", &configured)
            .finish()
    }
}

impl BearerAuth {
    /// Parses the comma-separated `MSGSTATS_API_KEYS` value.
    ///
    /// # Errors
    ///
    /// Fails when no key is configured and the server is not in development.
    pub fn from_keys(raw: Option<&str>, is_development: bool) -> anyhow::Result<Self> {
        let mut keys: Vec<String> = raw
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        keys.sort();
        keys.dedup();

        match (keys.is_empty(), is_development) {
            (false, _) => Ok(Self {
                keys: Some(keys.into()),
            }),
            (true, true) => {
                tracing::warn!("MSGSTATS_API_KEYS is empty, serving the API without auth");
                Ok(Self::open())
            }
            (true, false) => anyhow::bail!(
                "MSGSTATS_API_KEYS must list at least one bearer token outside development"
            ),
        }
    }

    #[must_use]
    pub fn open() -> Self {
        Self { keys: None }
    }

    /// Checks `token` against every key so timing does not depend on which matched.
    fn permits(&self, token: Option<&str>) -> bool {
        let Some(keys) = &self.keys else {
            return true;
        };
        let Some(token) = token else {
            return false;
        };
        keys.iter().fold(false, |hit, key| {
            hit | bool::from(key.as_bytes().ct_eq(token.as_bytes()))
        })
    }
}

/// Tags each request with the caller's `x-request-id`, or a fresh v4 UUID.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<BearerAuth>,
    req: Request,
    next: Next,
) -> Response {
    if auth.permits(bearer_token(req.headers())) {
        return next.run(req).await;
    }

    let rid = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    ApiError::new(rid, "unauthorized", "missing or invalid bearer token").into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
