//! Process-wide configuration: defaults, file overlay, environment
//! overlay, validation at construction.
//!
//! Layers built-in defaults under a `~/.wasp/config.json` file, then a
//! further `WASP_*` environment layer on top — wasp's deployment
//! targets (a systemd unit, a container) favor env overrides over
//! editing a JSON file in place.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{WaspError, WaspResult};
use crate::policy::ToolPolicyConfig;
use crate::rate_limit::RateLimitConfig;
use crate::signature::{SignatureAction, SignatureConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_api_token_env() -> String {
    "WASP_API_TOKEN".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_token_env: default_api_token_env(),
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaspConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_dangerous_tools")]
    pub dangerous_tools: HashSet<String>,
    #[serde(default = "default_safe_tools")]
    pub safe_tools: HashSet<String>,
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,
    #[serde(default = "default_quarantine_preview_chars")]
    pub quarantine_preview_chars: usize,
    #[serde(default = "default_telemetry_preview_chars")]
    pub telemetry_preview_chars: usize,
    #[serde(default = "default_telemetry_threshold")]
    pub telemetry_threshold: f64,
    #[serde(default)]
    pub signature: SignatureConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub session_strict: bool,
    /// Whether a blocked inbound message (contact not in the whitelist)
    /// is held for review rather than silently dropped.
    #[serde(default = "default_quarantine_on_deny")]
    pub quarantine_on_deny: bool,
}

fn default_quarantine_on_deny() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wasp")
}

fn default_dangerous_tools() -> HashSet<String> {
    ToolPolicyConfig::default_constants().dangerous_tools
}

fn default_safe_tools() -> HashSet<String> {
    ToolPolicyConfig::default_constants().safe_tools
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_rate_limit_max_requests() -> u32 {
    100
}

fn default_quarantine_preview_chars() -> usize {
    100
}

fn default_telemetry_preview_chars() -> usize {
    200
}

fn default_telemetry_threshold() -> f64 {
    0.5
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            signature: String::new(),
            signature_prefix: None,
            action: SignatureAction::Append,
            channels: Vec::new(),
        }
    }
}

impl Default for WaspConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            dangerous_tools: default_dangerous_tools(),
            safe_tools: default_safe_tools(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            quarantine_preview_chars: default_quarantine_preview_chars(),
            telemetry_preview_chars: default_telemetry_preview_chars(),
            telemetry_threshold: default_telemetry_threshold(),
            signature: SignatureConfig::default(),
            admin: AdminConfig::default(),
            session_strict: false,
            quarantine_on_deny: default_quarantine_on_deny(),
        }
    }
}

impl WaspConfig {
    /// Layers, lowest to highest precedence: built-in defaults,
    /// `~/.wasp/config.json` if present, then `WASP_*` environment
    /// variables. CLI flags are applied by the caller afterward via
    /// `apply_overrides`, since only `wasp-cli` has flags to apply.
    pub fn load() -> WaspResult<Self> {
        let config_path = Self::resolve_path("config.json");

        let mut config = if config_path.exists() {
            let data = std::fs::read_to_string(&config_path)
                .map_err(|e| WaspError::Misconfigured(format!("reading {config_path:?}: {e}")))?;
            serde_json::from_str::<WaspConfig>(&data)
                .map_err(|e| WaspError::Misconfigured(format!("parsing {config_path:?}: {e}")))?
        } else {
            WaspConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WASP_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("WASP_RATE_LIMIT_WINDOW_MS") {
            if let Ok(parsed) = v.parse() {
                self.rate_limit_window_ms = parsed;
            }
        }
        if let Ok(v) = std::env::var("WASP_RATE_LIMIT_MAX_REQUESTS") {
            if let Ok(parsed) = v.parse() {
                self.rate_limit_max_requests = parsed;
            }
        }
        if let Ok(v) = std::env::var("WASP_TELEMETRY_THRESHOLD") {
            if let Ok(parsed) = v.parse() {
                self.telemetry_threshold = parsed;
            }
        }
        if let Ok(v) = std::env::var("WASP_ADMIN_BIND_ADDR") {
            self.admin.bind_addr = v;
        }
    }

    /// Fails fast on configuration errors the component-level checks
    /// would otherwise only discover at first use.
    pub fn validate(&self) -> WaspResult<()> {
        self.signature.validate()?;
        if self.telemetry_threshold < 0.0 || self.telemetry_threshold > 1.0 {
            return Err(WaspError::Misconfigured(
                "telemetry_threshold must be within [0, 1]".to_string(),
            ));
        }
        if self.rate_limit_max_requests == 0 {
            return Err(WaspError::Misconfigured(
                "rate_limit_max_requests must be nonzero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            window_ms: self.rate_limit_window_ms,
            max_requests: self.rate_limit_max_requests,
        }
    }

    pub fn tool_policy_config(&self) -> ToolPolicyConfig {
        ToolPolicyConfig {
            dangerous_tools: self.dangerous_tools.clone(),
            safe_tools: self.safe_tools.clone(),
        }
    }

    pub fn resolve_path(relative: &str) -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wasp")
            .join(relative)
    }
}
