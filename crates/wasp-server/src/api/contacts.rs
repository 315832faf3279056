//! `GET|POST /contacts`, `DELETE /contacts/:identifier` (auth required).

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use wasp_core::{Platform, TrustLevel, WaspError};

use crate::auth::ApiGuard;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    platform: Option<String>,
    trust: Option<String>,
}

pub async fn list_contacts(
    _guard: ApiGuard,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let platform = query.platform.map(|p| p.parse::<Platform>()).transpose().map_err(AppError)?;
    let trust = query.trust.map(|t| t.parse::<TrustLevel>()).transpose().map_err(AppError)?;

    let contacts = state.wasp.contacts.list(platform, trust).await.map_err(AppError)?;
    Ok(Json(contacts))
}

#[derive(Debug, Deserialize)]
pub struct UpsertRequest {
    identifier: String,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    trust: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

pub async fn upsert_contact(
    _guard: ApiGuard,
    State(state): State<AppState>,
    Json(body): Json<UpsertRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.identifier.is_empty() {
        return Err(AppError(WaspError::InvalidInput(
            "identifier must not be empty".to_string(),
        )));
    }
    let platform: Platform = body
        .platform
        .as_deref()
        .unwrap_or("whatsapp")
        .parse()
        .map_err(AppError)?;
    let trust: TrustLevel = body
        .trust
        .as_deref()
        .unwrap_or("limited")
        .parse()
        .map_err(AppError)?;

    let contact = state
        .wasp
        .contacts
        .upsert(
            &body.identifier,
            platform,
            trust,
            body.name.as_deref(),
            body.notes.as_deref(),
        )
        .await
        .map_err(AppError)?;

    Ok(Json(contact))
}

#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    platform: Option<String>,
}

pub async fn remove_contact(
    _guard: ApiGuard,
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(query): Query<RemoveQuery>,
) -> Result<impl IntoResponse, AppError> {
    let platform: Platform = query
        .platform
        .as_deref()
        .unwrap_or("whatsapp")
        .parse()
        .map_err(AppError)?;

    let removed = state
        .wasp
        .contacts
        .remove(&identifier, platform)
        .await
        .map_err(AppError)?;

    if !removed {
        return Err(AppError(WaspError::NotFound(format!(
            "contact {identifier}/{platform}"
        ))));
    }

    Ok(Json(serde_json::json!({ "removed": true })))
}
