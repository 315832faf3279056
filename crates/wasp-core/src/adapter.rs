//! The host-runtime adapter contract.
//!
//! `wasp-core` does not know about any specific agent runtime, channel
//! SDK, or wire protocol — that integration shim lives outside this
//! crate. What the core does own is the *contract* the shim is built
//! against: the four callback points, and the policy wiring that ties
//! contact lookup, audit, quarantine, session state, tool policy, and
//! the injection heuristic into one coherent decision per callback.
//!
//! Expressed as an `#[async_trait] pub trait ...: Send + Sync` with one
//! method per callback, so any runtime adapter can be dropped in behind it.

use async_trait::async_trait;

use crate::audit::Decision;
use crate::contacts::Platform;
use crate::error::WaspResult;
use crate::policy::ToolDecision;
use crate::signature::SignatureOutcome;
use crate::Wasp;

/// An inbound message delivered by the host, along with the sender
/// identity and session key it arrived under.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub content: String,
    pub sender_identifier: String,
    pub platform: Platform,
    pub session_key: Option<String>,
}

/// A request to run a tool on behalf of the current turn.
#[derive(Debug, Clone)]
pub struct PreToolCall {
    pub tool_name: String,
    pub session_key: Option<String>,
}

/// An agent-authored message about to leave on a given channel.
#[derive(Debug, Clone)]
pub struct PreOutboundMessage {
    pub content: String,
    pub channel: String,
    pub from_agent: bool,
    pub session_key: Option<String>,
}

/// The four callback points a host adapter wires into its own event
/// loop. Each method's return value carries exactly what its caller
/// needs to act on — no more, no less.
#[async_trait]
pub trait HostAdapterPort: Send + Sync {
    /// Cannot veto delivery; purely observational-plus-stateful.
    async fn on_inbound(&self, message: InboundMessage) -> WaspResult<()>;

    /// A strict gate. `Some` carries the block reason; `None` is a no-op
    /// (the tool call proceeds).
    async fn on_pre_tool_call(&self, call: PreToolCall) -> WaspResult<Option<ToolDecision>>;

    /// Signature guard only. Never used to re-run the tool/contact
    /// decisions — outbound inspection is an orthogonal flow.
    async fn on_pre_outbound(&self, message: PreOutboundMessage) -> WaspResult<SignatureOutcome>;

    /// Clears turn state.
    fn on_turn_end(&self, session_key: Option<&str>) -> WaspResult<()>;
}

#[async_trait]
impl HostAdapterPort for Wasp {
    async fn on_inbound(&self, message: InboundMessage) -> WaspResult<()> {
        let check = self
            .contacts
            .check(&message.sender_identifier, message.platform)
            .await?;

        let decision = if !check.allowed {
            Decision::Deny
        } else if check.trust == Some(crate::contacts::TrustLevel::Limited) {
            Decision::Limited
        } else {
            Decision::Allow
        };
        self.audit
            .log(
                &message.sender_identifier,
                message.platform,
                decision,
                &check.reason,
            )
            .await?;

        match decision {
            Decision::Deny => tracing::warn!(
                identifier = %message.sender_identifier,
                platform = %message.platform,
                reason = %check.reason,
                "inbound message denied"
            ),
            Decision::Limited => tracing::info!(
                identifier = %message.sender_identifier,
                platform = %message.platform,
                reason = %check.reason,
                "inbound message allowed (limited trust)"
            ),
            Decision::Allow => tracing::info!(
                identifier = %message.sender_identifier,
                platform = %message.platform,
                "inbound message allowed"
            ),
        }

        if !check.allowed && self.config.quarantine_on_deny {
            self.quarantine
                .quarantine(&message.sender_identifier, message.platform, &message.content)
                .await?;
        }

        self.sessions.set_turn_full(
            message.session_key.as_deref(),
            check.trust,
            &message.sender_identifier,
            Some(message.platform),
        )?;

        // Telemetry-only: never affects the decision above, runs for
        // every sender including already-trusted ones.
        self.heuristic
            .analyze_and_record(&message.content, &message.sender_identifier, message.platform)
            .await?;

        Ok(())
    }

    async fn on_pre_tool_call(&self, call: PreToolCall) -> WaspResult<Option<ToolDecision>> {
        let turn = self.sessions.get_turn(call.session_key.as_deref())?;
        let decision = self.tool_policy.decide(&call.tool_name, turn.trust);

        // Every decision gets an audit row, even when no turn is bound for
        // this session (never reached via `on_inbound`, or already cleared
        // by `on_turn_end`) — the sender identifier falls back to the
        // session key, then to a bare "unknown" sentinel, rather than
        // skipping the write.
        let identifier = turn.sender.as_deref().unwrap_or_else(|| {
            call.session_key
                .as_deref()
                .unwrap_or(crate::session::DEFAULT_SESSION_KEY)
        });
        let audit_decision = if decision.allowed {
            match turn.trust {
                Some(crate::contacts::TrustLevel::Limited) => Decision::Limited,
                _ => Decision::Allow,
            }
        } else {
            Decision::Deny
        };
        let reason = decision
            .reason
            .clone()
            .unwrap_or_else(|| format!("tool {} allowed", call.tool_name));
        self.audit
            .log(identifier, turn.platform, audit_decision, &reason)
            .await?;

        match audit_decision {
            Decision::Deny => tracing::warn!(
                tool = %call.tool_name,
                identifier = %identifier,
                "tool call blocked"
            ),
            _ => tracing::info!(
                tool = %call.tool_name,
                identifier = %identifier,
                "tool call allowed"
            ),
        }

        if decision.allowed {
            Ok(None)
        } else {
            Ok(Some(decision))
        }
    }

    async fn on_pre_outbound(&self, message: PreOutboundMessage) -> WaspResult<SignatureOutcome> {
        Ok(self
            .signature_guard
            .check(&message.content, &message.channel, message.from_agent))
    }

    fn on_turn_end(&self, session_key: Option<&str>) -> WaspResult<()> {
        self.sessions.clear_turn(session_key)
    }
}
