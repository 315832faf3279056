//! `POST /check` — rate-limited, unauthenticated whitelist probe.
//!
//! Mirrors `ContactRegistry::check` verbatim; does not write an audit
//! row itself — that happens on the host adapter's inbound-message path,
//! not on this read-only diagnostic endpoint.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use wasp_core::{Platform, WaspError};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    identifier: String,
    #[serde(default)]
    platform: Option<String>,
}

pub async fn check(
    State(state): State<AppState>,
    Json(body): Json<CheckRequest>,
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

    let result = state
        .wasp
        .contacts
        .check(&body.identifier, platform)
        .await
        .map_err(AppError)?;

    Ok(Json(result))
}
