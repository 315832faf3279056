//! Client IP resolution for rate limiting and the loopback-only auth
//! fallback.
//!
//! Precedence: first comma-separated entry of `X-Forwarded-For`, then
//! `X-Real-IP`, then the sentinel `"direct"` for a connection that
//! carried neither header (a host talking to its own loopback bind).

use axum::http::HeaderMap;

pub const DIRECT_CONNECT_SENTINEL: &str = "direct";

pub fn extract_client_ip(headers: &HeaderMap) -> String {
    if let Some(xff) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = xff.split(',').next() {
            let ip = first.trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    if let Some(xri) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let ip = xri.trim();
        if !ip.is_empty() {
            return ip.to_string();
        }
    }

    DIRECT_CONNECT_SENTINEL.to_string()
}

pub fn is_loopback(ip: &str) -> bool {
    matches!(ip, "127.0.0.1" | "::1" | DIRECT_CONNECT_SENTINEL)
}
