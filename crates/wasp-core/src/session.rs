//! Per-session turn-state manager.
//!
//! Binds an inbound sender's trust to subsequent tool-call decisions for
//! the same session key, via a lock-protected `HashMap<String, _>`
//! holding process-wide, non-durable state keyed by an arbitrary string.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::contacts::{Platform, TrustLevel};
use crate::error::{WaspError, WaspResult};

/// The sentinel used when the host doesn't supply a session key. Calls
/// using the sentinel from genuinely different conversations collapse
/// into one bucket — a documented footgun, not a bug.
pub const DEFAULT_SESSION_KEY: &str = "__default__";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnState {
    pub trust: Option<TrustLevel>,
    pub sender: Option<String>,
    /// Carried so a tool-call decision can emit a full `AuditEntry`
    /// (which needs a platform) without the adapter threading a second
    /// lookup. Always `None` for turns set via the bare `set_turn`.
    pub platform: Option<Platform>,
}

/// Keeps a mapping from session key to turn state. Operations on distinct
/// keys never observe or mutate each other's state; operations on the
/// same key are linearizable because they all go through a single
/// `RwLock`-guarded map.
pub struct SessionStateManager {
    turns: RwLock<HashMap<String, TurnState>>,
    strict: bool,
}

impl SessionStateManager {
    /// `strict = true` rejects operations that omit a session key instead
    /// of silently collapsing them onto the sentinel.
    pub fn new(strict: bool) -> Self {
        Self {
            turns: RwLock::new(HashMap::new()),
            strict,
        }
    }

    fn resolve_key<'a>(&self, session_key: Option<&'a str>) -> WaspResult<&'a str> {
        match session_key {
            Some(k) => Ok(k),
            None if self.strict => Err(WaspError::InvalidInput(
                "session key is required in strict mode".to_string(),
            )),
            None => Ok(DEFAULT_SESSION_KEY),
        }
    }

    /// Records the trust level and sender for the active turn on a
    /// session.
    pub fn set_turn(
        &self,
        session_key: Option<&str>,
        trust: Option<TrustLevel>,
        sender: &str,
    ) -> WaspResult<()> {
        self.set_turn_full(session_key, trust, sender, None)
    }

    /// As `set_turn`, additionally recording the platform the turn was
    /// bound on. Used by the host-adapter wiring (`adapter.rs`) so a
    /// later tool-call decision can emit a complete audit row.
    pub fn set_turn_full(
        &self,
        session_key: Option<&str>,
        trust: Option<TrustLevel>,
        sender: &str,
        platform: Option<Platform>,
    ) -> WaspResult<()> {
        let key = self.resolve_key(session_key)?;
        self.turns.write().insert(
            key.to_string(),
            TurnState {
                trust,
                sender: Some(sender.to_string()),
                platform,
            },
        );
        Ok(())
    }

    /// Returns `{trust: None, sender: None}` when no entry exists for the
    /// (resolved) session key.
    pub fn get_turn(&self, session_key: Option<&str>) -> WaspResult<TurnState> {
        let key = self.resolve_key(session_key)?;
        Ok(self.turns.read().get(key).cloned().unwrap_or_default())
    }

    pub fn clear_turn(&self, session_key: Option<&str>) -> WaspResult<()> {
        let key = self.resolve_key(session_key)?;
        self.turns.write().remove(key);
        Ok(())
    }
}

impl Default for SessionStateManager {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_turn_on_missing_key_is_empty() {
        let mgr = SessionStateManager::default();
        let state = mgr.get_turn(Some("nope")).unwrap();
        assert_eq!(state, TurnState::default());
    }

    #[test]
    fn set_then_get_round_trips() {
        let mgr = SessionStateManager::default();
        mgr.set_turn(Some("s1"), Some(TrustLevel::Sovereign), "+4401")
            .unwrap();
        let state = mgr.get_turn(Some("s1")).unwrap();
        assert_eq!(state.trust, Some(TrustLevel::Sovereign));
        assert_eq!(state.sender.as_deref(), Some("+4401"));
    }

    #[test]
    fn clear_then_get_is_empty() {
        let mgr = SessionStateManager::default();
        mgr.set_turn(Some("s1"), Some(TrustLevel::Trusted), "a")
            .unwrap();
        mgr.clear_turn(Some("s1")).unwrap();
        assert_eq!(mgr.get_turn(Some("s1")).unwrap(), TurnState::default());
    }

    #[test]
    fn distinct_keys_are_isolated() {
        let mgr = SessionStateManager::default();
        mgr.set_turn(Some("s1"), Some(TrustLevel::Sovereign), "a")
            .unwrap();
        mgr.set_turn(Some("s2"), None, "b").unwrap();
        assert_eq!(
            mgr.get_turn(Some("s1")).unwrap().trust,
            Some(TrustLevel::Sovereign)
        );
        assert_eq!(mgr.get_turn(Some("s2")).unwrap().trust, None);

        mgr.clear_turn(Some("s2")).unwrap();
        assert_eq!(
            mgr.get_turn(Some("s1")).unwrap().trust,
            Some(TrustLevel::Sovereign),
            "clearing s2 must not affect s1"
        );
    }

    #[test]
    fn missing_session_key_uses_default_sentinel() {
        let mgr = SessionStateManager::default();
        mgr.set_turn(None, Some(TrustLevel::Limited), "x").unwrap();
        let state = mgr.get_turn(None).unwrap();
        assert_eq!(state.trust, Some(TrustLevel::Limited));
        let via_sentinel = mgr.get_turn(Some(DEFAULT_SESSION_KEY)).unwrap();
        assert_eq!(via_sentinel, state);
    }

    #[test]
    fn strict_mode_rejects_missing_session_key() {
        let mgr = SessionStateManager::new(true);
        let err = mgr
            .set_turn(None, Some(TrustLevel::Limited), "x")
            .unwrap_err();
        assert!(matches!(err, WaspError::InvalidInput(_)));
        let err = mgr.get_turn(None).unwrap_err();
        assert!(matches!(err, WaspError::InvalidInput(_)));
    }

    #[test]
    fn concurrent_sessions_do_not_race() {
        use std::sync::Arc;
        use std::thread;

        let mgr = Arc::new(SessionStateManager::default());
        let mut handles = Vec::new();
        for i in 0..16 {
            let mgr = Arc::clone(&mgr);
            handles.push(thread::spawn(move || {
                let key = format!("session-{i}");
                for _ in 0..100 {
                    mgr.set_turn(Some(&key), Some(TrustLevel::Sovereign), "x")
                        .unwrap();
                    let state = mgr.get_turn(Some(&key)).unwrap();
                    assert_eq!(state.trust, Some(TrustLevel::Sovereign));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
