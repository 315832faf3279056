//! Append-only decision record with filtered query.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::contacts::Platform;
use crate::error::WaspResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
    Limited,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::Limited => "limited",
        }
    }
}

impl std::str::FromStr for Decision {
    type Err = crate::error::WaspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Decision::Allow),
            "deny" => Ok(Decision::Deny),
            "limited" => Ok(Decision::Limited),
            other => Err(crate::error::WaspError::InvalidInput(format!(
                "unknown decision: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub identifier: String,
    /// `None` for decisions made about a session with no bound turn (no
    /// `(identifier, platform)` pair to attach) — every decision is still
    /// logged, just without a platform to tag it with.
    pub platform: Option<Platform>,
    pub decision: Decision,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub limit: Option<u32>,
    pub decision: Option<Decision>,
    pub since: Option<String>,
}

/// The configured maximum for `limit` when callers don't impose a
/// smaller one themselves (the admin façade honors this too).
pub const MAX_QUERY_LIMIT: u32 = 1000;

pub struct AuditLog {
    pool: SqlitePool,
}

impl AuditLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// `platform` accepts a bare `Platform` or an `Option<Platform>` —
    /// `None` when the decision was made for a session with no bound
    /// turn and therefore no known platform to attach.
    pub async fn log(
        &self,
        identifier: &str,
        platform: impl Into<Option<Platform>>,
        decision: Decision,
        reason: &str,
    ) -> WaspResult<()> {
        let platform = platform.into();
        sqlx::query(
            "INSERT INTO audit_log (timestamp, identifier, platform, decision, reason) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(crate::util::now_iso8601())
        .bind(identifier)
        .bind(platform.map(|p| p.as_str()))
        .bind(decision.as_str())
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Newest-first. `limit = Some(0)` returns zero rows; an unset or
    /// oversized limit is clamped to `MAX_QUERY_LIMIT`.
    pub async fn query(&self, query: AuditQuery) -> WaspResult<Vec<AuditEntry>> {
        if query.limit == Some(0) {
            return Ok(Vec::new());
        }
        let limit = query.limit.unwrap_or(MAX_QUERY_LIMIT).min(MAX_QUERY_LIMIT);

        let rows = sqlx::query(
            "SELECT id, timestamp, identifier, platform, decision, reason FROM audit_log \
             WHERE (?1 IS NULL OR decision = ?1) AND (?2 IS NULL OR timestamp >= ?2) \
             ORDER BY id DESC LIMIT ?3",
        )
        .bind(query.decision.map(|d| d.as_str()))
        .bind(query.since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let platform_str: Option<String> = row.try_get("platform")?;
                let decision_str: String = row.try_get("decision")?;
                Ok(AuditEntry {
                    id: row.try_get("id")?,
                    timestamp: row.try_get("timestamp")?,
                    identifier: row.try_get("identifier")?,
                    platform: platform_str.map(|s| s.parse()).transpose()?,
                    decision: decision_str.parse()?,
                    reason: row.try_get("reason")?,
                })
            })
            .collect()
    }

    pub async fn purge_older_than(&self, days: i64) -> WaspResult<u64> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(days);
        let result = sqlx::query("DELETE FROM audit_log WHERE timestamp < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
