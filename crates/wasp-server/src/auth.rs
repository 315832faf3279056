//! `ApiGuard` extractor: bearer-token auth when a token is configured,
//! loopback-only access otherwise.
//!
//! An `axum::extract::FromRequestParts` extractor that handlers opt into
//! by naming it as a parameter, rather than a middleware layer every
//! route must be wired into individually.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::client_ip::{extract_client_ip, is_loopback};
use crate::error::AppError;
use crate::state::AppState;

pub struct ApiGuard;

#[async_trait]
impl FromRequestParts<AppState> for ApiGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected_hash) = &state.api_token_hash else {
            let ip = extract_client_ip(&parts.headers);
            return if is_loopback(&ip) {
                Ok(ApiGuard)
            } else {
                Err(AppError(wasp_core::WaspError::Unauthorized))
            };
        };

        let provided = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
            .unwrap_or("");

        let provided_hash = Sha256::digest(provided.as_bytes());
        if bool::from(provided_hash.ct_eq(expected_hash.as_slice())) {
            Ok(ApiGuard)
        } else {
            Err(AppError(wasp_core::WaspError::Unauthorized))
        }
    }
}
