//! Policy-decision and policy-enforcement core for an agentic assistant's
//! inbound/outbound boundary: contact whitelist, per-session trust,
//! tool-access policy, injection telemetry, quarantine, audit, rate
//! limiting, and the outbound signature guard.

pub mod adapter;
pub mod audit;
pub mod config;
pub mod contacts;
pub mod error;
pub mod heuristic;
pub mod policy;
pub mod quarantine;
pub mod rate_limit;
pub mod session;
pub mod signature;
pub mod storage;
mod util;

pub use adapter::{HostAdapterPort, InboundMessage, PreOutboundMessage, PreToolCall};
pub use audit::{AuditEntry, AuditLog, AuditQuery, Decision};
pub use config::WaspConfig;
pub use contacts::{CheckResult, Contact, ContactRegistry, Platform, TrustLevel};
pub use error::{WaspError, WaspResult};
pub use heuristic::{InjectionAnalysis, InjectionHeuristic, TelemetryRow};
pub use policy::{ToolDecision, ToolPolicyConfig, ToolPolicyEngine};
pub use quarantine::{Quarantine, QuarantinedMessage};
pub use rate_limit::{RateLimitConfig, RateLimitResult, RateLimiter};
pub use session::{SessionStateManager, TurnState, DEFAULT_SESSION_KEY};
pub use signature::{SignatureAction, SignatureConfig, SignatureGuard, SignatureOutcome};
pub use storage::Storage;

use std::sync::Arc;

/// Every collaborator wired against one `Storage` handle and one
/// `WaspConfig`, built once at process start.
pub struct Wasp {
    pub config: WaspConfig,
    pub contacts: ContactRegistry,
    pub sessions: Arc<SessionStateManager>,
    pub tool_policy: ToolPolicyEngine,
    pub heuristic: InjectionHeuristic,
    pub quarantine: Quarantine,
    pub audit: AuditLog,
    pub rate_limiter: Arc<RateLimiter>,
    pub signature_guard: SignatureGuard,
}

impl Wasp {
    pub async fn open(config: WaspConfig) -> WaspResult<Self> {
        config.validate()?;
        let storage = Storage::open(&config.data_dir).await?;
        let pool = storage.pool().clone();

        Ok(Self {
            contacts: ContactRegistry::new(pool.clone()),
            sessions: Arc::new(SessionStateManager::new(config.session_strict)),
            tool_policy: ToolPolicyEngine::new(config.tool_policy_config()),
            heuristic: InjectionHeuristic::new(
                pool.clone(),
                config.telemetry_preview_chars,
                config.telemetry_threshold,
            ),
            quarantine: Quarantine::new(pool.clone(), config.quarantine_preview_chars),
            audit: AuditLog::new(pool),
            rate_limiter: Arc::new(RateLimiter::new()),
            signature_guard: SignatureGuard::new(config.signature.clone())?,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_wires_every_collaborator_against_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WaspConfig::default();
        config.data_dir = dir.path().to_path_buf();
        let wasp = Wasp::open(config).await.unwrap();

        wasp.contacts
            .upsert("+4401", Platform::Whatsapp, TrustLevel::Sovereign, None, None)
            .await
            .unwrap();
        let result = wasp.contacts.check("+4401", Platform::Whatsapp).await.unwrap();
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn open_rejects_misconfigured_signature_guard() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WaspConfig::default();
        config.data_dir = dir.path().to_path_buf();
        config.signature.enabled = true;
        config.signature.signature = String::new();

        let err = Wasp::open(config).await.unwrap_err();
        assert!(matches!(err, WaspError::Misconfigured(_)));
    }
}
