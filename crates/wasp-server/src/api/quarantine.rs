//! `GET /quarantine`, `POST /quarantine/:identifier/release`,
//! `DELETE /quarantine/:identifier` (all auth required).

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use wasp_core::Platform;

use crate::auth::ApiGuard;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<u32>,
}

pub async fn list_quarantine(
    _guard: ApiGuard,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(100).min(1000);
    let rows = state
        .wasp
        .quarantine
        .list_unreviewed(limit)
        .await
        .map_err(AppError)?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct PlatformQuery {
    platform: Option<String>,
}

pub async fn release_quarantine(
    _guard: ApiGuard,
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(query): Query<PlatformQuery>,
) -> Result<impl IntoResponse, AppError> {
    let platform: Platform = query
        .platform
        .as_deref()
        .unwrap_or("whatsapp")
        .parse()
        .map_err(AppError)?;

    let released = state
        .wasp
        .quarantine
        .release(&identifier, platform)
        .await
        .map_err(AppError)?;
    Ok(Json(released))
}

pub async fn delete_quarantine(
    _guard: ApiGuard,
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(query): Query<PlatformQuery>,
) -> Result<impl IntoResponse, AppError> {
    let platform: Platform = query
        .platform
        .as_deref()
        .unwrap_or("whatsapp")
        .parse()
        .map_err(AppError)?;

    let deleted = state
        .wasp
        .quarantine
        .delete(&identifier, platform)
        .await
        .map_err(AppError)?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
