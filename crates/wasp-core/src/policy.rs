//! Tool access policy engine: list-precedence and default rules.
//!
//! An allow/deny `HashSet<String>` pair with deny-wins precedence,
//! extended from a single binary allow/deny gate into a three-way,
//! trust-aware decision.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::contacts::TrustLevel;

#[derive(Debug, Clone)]
pub struct ToolPolicyConfig {
    pub dangerous_tools: HashSet<String>,
    pub safe_tools: HashSet<String>,
}

impl ToolPolicyConfig {
    pub fn default_constants() -> Self {
        let dangerous_tools = ["exec", "write", "message", "gateway", "Edit", "Write"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let safe_tools = ["web_search", "memory_search", "Read", "session_status"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self {
            dangerous_tools,
            safe_tools,
        }
    }
}

impl Default for ToolPolicyConfig {
    fn default() -> Self {
        Self::default_constants()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl ToolDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn block(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Stateless: two identical inputs always produce identical outputs.
pub struct ToolPolicyEngine {
    config: ToolPolicyConfig,
}

impl ToolPolicyEngine {
    pub fn new(config: ToolPolicyConfig) -> Self {
        Self { config }
    }

    /// Decide whether `tool_name` may run given the caller's current
    /// turn trust. `trust = None` covers both "unknown sender" and "no
    /// turn bound for this session".
    pub fn decide(&self, tool_name: &str, trust: Option<TrustLevel>) -> ToolDecision {
        if let Some(t) = trust {
            if t.is_elevated() {
                return ToolDecision::allow();
            }
        }

        // Untrusted/unknown: dangerous wins over safe on overlap — a
        // monotonic-safety invariant, configurations can only tighten.
        if self.config.dangerous_tools.contains(tool_name) {
            return ToolDecision::block(format!(
                "tool {tool_name} blocked for untrusted sender"
            ));
        }
        if self.config.safe_tools.contains(tool_name) {
            return ToolDecision::allow();
        }

        // Unlisted: default-allow. Deliberate, and a known softness —
        // new tools must be explicitly classified or they default to
        // allowed. A default-deny mode is a reasonable hardening
        // alternative for deployments that want it.
        ToolDecision::allow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ToolPolicyEngine {
        ToolPolicyEngine::new(ToolPolicyConfig::default_constants())
    }

    #[test]
    fn sovereign_allows_any_tool() {
        let e = engine();
        let d = e.decide("exec", Some(TrustLevel::Sovereign));
        assert!(d.allowed);
    }

    #[test]
    fn trusted_allows_any_tool() {
        let e = engine();
        let d = e.decide("write", Some(TrustLevel::Trusted));
        assert!(d.allowed);
    }

    #[test]
    fn limited_may_use_safe_tool() {
        let e = engine();
        let d = e.decide("web_search", Some(TrustLevel::Limited));
        assert!(d.allowed);
    }

    #[test]
    fn limited_blocked_from_dangerous_tool() {
        let e = engine();
        let d = e.decide("write", Some(TrustLevel::Limited));
        assert!(!d.allowed);
        assert!(d.reason.unwrap().contains("blocked for untrusted sender"));
    }

    #[test]
    fn unknown_blocked_from_dangerous_tool() {
        let e = engine();
        let d = e.decide("exec", None);
        assert!(!d.allowed);
    }

    #[test]
    fn unknown_allowed_for_unlisted_tool() {
        let e = engine();
        let d = e.decide("totally_new_tool", None);
        assert!(d.allowed, "unlisted tools default-allow");
    }

    #[test]
    fn dangerous_wins_precedence_on_overlap() {
        let mut config = ToolPolicyConfig::default_constants();
        config.safe_tools.insert("exec".to_string());
        let e = ToolPolicyEngine::new(config);
        let d = e.decide("exec", Some(TrustLevel::Limited));
        assert!(!d.allowed, "dangerous must win when a tool is in both sets");
    }

    #[test]
    fn idempotent_for_identical_inputs() {
        let e = engine();
        let d1 = e.decide("exec", Some(TrustLevel::Limited));
        let d2 = e.decide("exec", Some(TrustLevel::Limited));
        assert_eq!(d1, d2);
    }

    #[test]
    fn sovereign_ignores_tool_name_entirely() {
        let e = engine();
        for tool in ["exec", "write", "whatever", "Read"] {
            assert!(e.decide(tool, Some(TrustLevel::Sovereign)).allowed);
        }
    }
}
