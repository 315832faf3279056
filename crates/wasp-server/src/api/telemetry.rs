//! `GET /telemetry` (auth required) — read-only injection-heuristic feed,
//! mirroring `/audit`'s query shape.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::auth::ApiGuard;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TelemetryQueryParams {
    limit: Option<u32>,
    since: Option<String>,
}

pub async fn query_telemetry(
    _guard: ApiGuard,
    State(state): State<AppState>,
    Query(params): Query<TelemetryQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(1000).min(1000);
    let rows = state
        .wasp
        .heuristic
        .query(limit, params.since)
        .await
        .map_err(AppError)?;
    Ok(Json(rows))
}
