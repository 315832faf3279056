//! `GET /audit` (auth required).

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use wasp_core::{AuditQuery, Decision, WaspError};

use crate::auth::ApiGuard;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditQueryParams {
    limit: Option<u32>,
    decision: Option<String>,
    since: Option<String>,
}

pub async fn query_audit(
    _guard: ApiGuard,
    State(state): State<AppState>,
    Query(params): Query<AuditQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let decision: Option<Decision> = params
        .decision
        .map(|d| d.parse::<Decision>())
        .transpose()
        .map_err(AppError)?;

    if let Some(limit) = params.limit {
        if limit > wasp_core::audit::MAX_QUERY_LIMIT {
            return Err(AppError(WaspError::InvalidInput(format!(
                "limit must be between 1 and {}",
                wasp_core::audit::MAX_QUERY_LIMIT
            ))));
        }
    }

    let rows = state
        .wasp
        .audit
        .query(AuditQuery {
            limit: params.limit,
            decision,
            since: params.since,
        })
        .await
        .map_err(AppError)?;

    Ok(Json(rows))
}
