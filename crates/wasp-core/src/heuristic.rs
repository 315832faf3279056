//! Non-blocking injection heuristic: pattern & verb scoring, telemetry
//! persistence.
//!
//! Patterns are compiled exactly once into a process-wide static via
//! `std::sync::OnceLock`, since the catalogue is fixed rather than
//! caller-supplied — no per-call compilation cost.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::contacts::Platform;
use crate::error::WaspResult;

/// One matched pattern family from the injection-detection catalogue.
const PATTERN_CATALOGUE: &[(&str, &str)] = &[
    (
        "ignore_instructions",
        r"(?i)ignore\s+(previous|all|prior)\s+instructions",
    ),
    (
        "disregard_safety",
        r"(?i)disregard\s+(previous|safety|rules)",
    ),
    ("system_tag", r"(?i)\[(system|admin|root)\]"),
    ("from_authority", r"(?i)(from|by)\s*:\s*(system|admin)"),
    (
        "admin_mode",
        r"(?i)you\s+are\s+now\s+in\s+(admin|root|god)\s+mode",
    ),
    ("enable_mode", r"(?i)enable\s+(debug|admin)\s+mode"),
    ("close_tag", r"(?i)</(system|instructions|prompt)>"),
    ("new_instructions", r"(?i)new\s+instructions\s*:"),
    ("urgent_action", r"(?i)urgent[\s\S]{0,80}action\s+required"),
    (
        "must_action",
        r"(?i)must\s+(forward|send|execute|delete)",
    ),
    ("jailbreak", r"(?i)\b(dan|jailbreak|bypass\s+filters)\b"),
    (
        "pretend_mode",
        r"(?i)pretend\s+you\s+are\s+(unrestricted|evil|hacker)",
    ),
];

const SENSITIVE_VERBS: &[&str] = &[
    "forward", "send", "email", "share", "upload", "delete", "remove", "destroy", "execute",
    "run", "install", "download", "transfer", "payment", "purchase", "grant", "allow",
    "authorize",
];

struct CompiledCatalogue {
    set: RegexSet,
    names: Vec<&'static str>,
    verb_regexes: Vec<(&'static str, Regex)>,
}

static CATALOGUE: OnceLock<CompiledCatalogue> = OnceLock::new();

fn catalogue() -> &'static CompiledCatalogue {
    CATALOGUE.get_or_init(|| {
        let patterns: Vec<&str> = PATTERN_CATALOGUE.iter().map(|(_, p)| *p).collect();
        let set = RegexSet::new(&patterns).expect("pattern catalogue is valid regex");
        let names = PATTERN_CATALOGUE.iter().map(|(n, _)| *n).collect();
        let verb_regexes = SENSITIVE_VERBS
            .iter()
            .map(|v| {
                let re = Regex::new(&format!(r"(?i)\b{v}\b")).expect("verb regex is valid");
                (*v, re)
            })
            .collect();
        CompiledCatalogue {
            set,
            names,
            verb_regexes,
        }
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionAnalysis {
    pub score: f64,
    pub patterns: Vec<String>,
    pub sensitive_verbs: Vec<String>,
    pub identifier: String,
    pub platform: Platform,
    pub timestamp: String,
}

/// Scores `content` against the pattern and verb catalogues. Never
/// blocks — this is visibility only.
///
/// Each matched pattern contributes +0.3; each matched verb contributes
/// +0.1 up to a total verb contribution of +0.3; the final score is
/// clamped to `[0, 1]`.
pub fn analyze(content: &str, identifier: &str, platform: Platform) -> InjectionAnalysis {
    let cat = catalogue();

    let mut patterns = Vec::new();
    if !content.is_empty() {
        for idx in cat.set.matches(content).into_iter() {
            patterns.push(cat.names[idx].to_string());
        }
    }

    let mut sensitive_verbs = Vec::new();
    if !content.is_empty() {
        for (name, re) in &cat.verb_regexes {
            if re.is_match(content) {
                sensitive_verbs.push((*name).to_string());
            }
        }
    }

    let pattern_score = patterns.len() as f64 * 0.3;
    let verb_score = (sensitive_verbs.len() as f64 * 0.1).min(0.3);
    let score = (pattern_score + verb_score).clamp(0.0, 1.0);

    InjectionAnalysis {
        score,
        patterns,
        sensitive_verbs,
        identifier: identifier.to_string(),
        platform,
        timestamp: crate::util::now_iso8601(),
    }
}

fn truncate_preview(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let truncated: String = body.chars().take(max_chars).collect();
    format!("{truncated}...")
}

pub struct InjectionHeuristic {
    pool: SqlitePool,
    preview_chars: usize,
    threshold: f64,
}

impl InjectionHeuristic {
    pub fn new(pool: SqlitePool, preview_chars: usize, threshold: f64) -> Self {
        Self {
            pool,
            preview_chars,
            threshold,
        }
    }

    /// Runs `analyze` and persists a telemetry row only if the score
    /// exceeds the configured threshold (default 0.5). Returns the
    /// analysis regardless of whether a row was persisted.
    pub async fn analyze_and_record(
        &self,
        content: &str,
        identifier: &str,
        platform: Platform,
    ) -> WaspResult<InjectionAnalysis> {
        let analysis = analyze(content, identifier, platform);

        if analysis.score > self.threshold {
            let preview = truncate_preview(content, self.preview_chars);
            sqlx::query(
                "INSERT INTO injection_telemetry \
                 (identifier, platform, score, patterns, verbs, preview, timestamp) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&analysis.identifier)
            .bind(analysis.platform.as_str())
            .bind(analysis.score)
            .bind(serde_json::to_string(&analysis.patterns).unwrap_or_default())
            .bind(serde_json::to_string(&analysis.sensitive_verbs).unwrap_or_default())
            .bind(&preview)
            .bind(&analysis.timestamp)
            .execute(&self.pool)
            .await?;
        }

        Ok(analysis)
    }

    pub async fn query(&self, limit: u32, since: Option<String>) -> WaspResult<Vec<TelemetryRow>> {
        let rows = sqlx::query(
            "SELECT id, identifier, platform, score, patterns, verbs, preview, timestamp \
             FROM injection_telemetry \
             WHERE (?1 IS NULL OR timestamp >= ?1) \
             ORDER BY id DESC LIMIT ?2",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let platform_str: String = row.try_get("platform")?;
                let patterns_json: String = row.try_get("patterns")?;
                let verbs_json: String = row.try_get("verbs")?;
                Ok(TelemetryRow {
                    id: row.try_get("id")?,
                    identifier: row.try_get("identifier")?,
                    platform: platform_str.parse()?,
                    score: row.try_get("score")?,
                    patterns: serde_json::from_str(&patterns_json).unwrap_or_default(),
                    sensitive_verbs: serde_json::from_str(&verbs_json).unwrap_or_default(),
                    preview: row.try_get("preview")?,
                    timestamp: row.try_get("timestamp")?,
                })
            })
            .collect()
    }

    pub async fn purge_older_than(&self, days: i64) -> WaspResult<u64> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(days);
        let result = sqlx::query("DELETE FROM injection_telemetry WHERE timestamp < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRow {
    pub id: i64,
    pub identifier: String,
    pub platform: Platform,
    pub score: f64,
    pub patterns: Vec<String>,
    pub sensitive_verbs: Vec<String>,
    pub preview: String,
    pub timestamp: String,
}
