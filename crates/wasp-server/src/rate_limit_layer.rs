//! Per-client-IP rate-limit middleware for `/check`, wrapping
//! `wasp_core::RateLimiter` — defaults to 100 requests/minute per client.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::client_ip::extract_client_ip;
use crate::error::AppError;
use crate::state::AppState;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub async fn rate_limit_check(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_client_ip(request.headers());
    let config = state.wasp.config.rate_limit_config();
    let result = state.wasp.rate_limiter.check(&ip, now_ms(), config);

    if !result.allowed {
        return AppError(wasp_core::WaspError::RateLimited).into_response();
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-ratelimit-remaining",
        HeaderValue::from_str(&result.remaining.to_string()).unwrap(),
    );
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from_str(&result.reset_ms.to_string()).unwrap(),
    );
    response
}
