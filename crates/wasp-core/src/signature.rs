//! Outbound signature guard: enforces an identity marker on agent-authored
//! messages before they leave on configured channels.

use serde::{Deserialize, Serialize};

use crate::error::{WaspError, WaspResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAction {
    Append,
    Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureConfig {
    pub enabled: bool,
    pub signature: String,
    pub signature_prefix: Option<String>,
    pub action: SignatureAction,
    pub channels: Vec<String>,
}

impl SignatureConfig {
    /// Must be called before the guard accepts any traffic: an enabled
    /// guard with an empty signature is a configuration error, not a
    /// runtime one.
    pub fn validate(&self) -> WaspResult<()> {
        if self.enabled && self.signature.trim().is_empty() {
            return Err(WaspError::Misconfigured(
                "signature guard is enabled but signature is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureOutcome {
    PassThrough,
    Modified(String),
    Blocked { reason: String },
}

pub struct SignatureGuard {
    config: SignatureConfig,
}

impl SignatureGuard {
    pub fn new(config: SignatureConfig) -> WaspResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// `from_agent = false` (a relayed human message, not an
    /// agent-authored one) always passes through untouched.
    pub fn check(&self, content: &str, channel: &str, from_agent: bool) -> SignatureOutcome {
        if !self.config.enabled || !from_agent {
            return SignatureOutcome::PassThrough;
        }
        if !self.config.channels.iter().any(|c| c == channel) {
            return SignatureOutcome::PassThrough;
        }
        if content.contains(&self.config.signature) {
            return SignatureOutcome::PassThrough;
        }

        match self.config.action {
            SignatureAction::Block => SignatureOutcome::Blocked {
                reason: "missing signature".to_string(),
            },
            SignatureAction::Append => {
                let prefix = self.config.signature_prefix.as_deref().unwrap_or("");
                let modified = format!("{content}\n\n{prefix}{}", self.config.signature);
                SignatureOutcome::Modified(modified)
            }
        }
    }
}
