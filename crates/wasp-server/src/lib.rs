//! The admin HTTP façade as a library: `wasp-cli`'s `serve` subcommand
//! and the `wasp-server` binary both call [`run`] against an already
//! validated [`WaspConfig`].

pub mod api;
pub mod auth;
pub mod client_ip;
pub mod error;
pub mod rate_limit_layer;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use sha2::{Digest, Sha256};
use wasp_core::{Wasp, WaspConfig};

use crate::state::AppState;

/// Opens the store, wires the façade, and serves until the process is
/// killed. Does not install a tracing subscriber — the caller (CLI or
/// binary `main`) owns that decision.
pub async fn run(config: WaspConfig) -> anyhow::Result<()> {
    let bind_addr = config.admin.bind_addr.clone();
    let api_token_env = config.admin.api_token_env.clone();

    let wasp = Wasp::open(config).await.context("opening wasp store")?;

    let api_token_hash = match std::env::var(&api_token_env) {
        Ok(token) if !token.is_empty() => {
            tracing::info!(env_var = %api_token_env, "API bearer-token auth enabled");
            Some(Sha256::digest(token.as_bytes()).to_vec())
        }
        _ => {
            tracing::warn!(
                env_var = %api_token_env,
                "API bearer-token auth DISABLED — protected endpoints restricted to loopback"
            );
            None
        }
    };

    let state = AppState {
        wasp: Arc::new(wasp),
        api_token_hash,
    };

    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                let window_ms = state.wasp.config.rate_limit_window_ms;
                let now_ms = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;
                state.wasp.rate_limiter.sweep(now_ms, window_ms);
            }
        });
    }

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "wasp-server listening");

    axum::serve(listener, app).await.context("axum server error")?;

    Ok(())
}
