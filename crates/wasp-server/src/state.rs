//! Shared application state: one `Clone`-able struct of `Arc`s passed to
//! every handler.

use std::sync::Arc;

use wasp_core::Wasp;

#[derive(Clone)]
pub struct AppState {
    pub wasp: Arc<Wasp>,
    /// SHA-256 digest of the configured API token. `None` means no token
    /// is configured and protected endpoints fall back to a loopback-only
    /// policy.
    pub api_token_hash: Option<Vec<u8>>,
}
