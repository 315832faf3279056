//! Contact whitelist: the trust store consumed by the inbound pipeline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::error::{WaspError, WaspResult};

/// A channel a contact can be reached on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Whatsapp,
    Telegram,
    Email,
    Discord,
    Slack,
    Signal,
    Webchat,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Whatsapp => "whatsapp",
            Platform::Telegram => "telegram",
            Platform::Email => "email",
            Platform::Discord => "discord",
            Platform::Slack => "slack",
            Platform::Signal => "signal",
            Platform::Webchat => "webchat",
        }
    }
}

impl FromStr for Platform {
    type Err = WaspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whatsapp" => Ok(Platform::Whatsapp),
            "telegram" => Ok(Platform::Telegram),
            "email" => Ok(Platform::Email),
            "discord" => Ok(Platform::Discord),
            "slack" => Ok(Platform::Slack),
            "signal" => Ok(Platform::Signal),
            "webchat" => Ok(Platform::Webchat),
            other => Err(WaspError::InvalidInput(format!(
                "unknown platform: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered capability label, not a numeric rank.
///
/// `sovereign` >= `trusted` > `limited`. Absence of a contact row is a
/// distinct fourth state ("unknown") handled by `CheckResult`, not by this
/// enum — there is deliberately no `Unknown` variant here so a `Contact`
/// row always carries one of the three explicit trust labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Limited,
    Trusted,
    Sovereign,
}

impl TrustLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::Limited => "limited",
            TrustLevel::Trusted => "trusted",
            TrustLevel::Sovereign => "sovereign",
        }
    }

    /// `true` for `trusted` and `sovereign`, the two labels that skip the
    /// tool policy engine's dangerous/safe-list check entirely.
    pub fn is_elevated(&self) -> bool {
        matches!(self, TrustLevel::Trusted | TrustLevel::Sovereign)
    }
}

impl FromStr for TrustLevel {
    type Err = WaspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "limited" => Ok(TrustLevel::Limited),
            "trusted" => Ok(TrustLevel::Trusted),
            "sovereign" => Ok(TrustLevel::Sovereign),
            other => Err(WaspError::InvalidInput(format!(
                "unknown trust level: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub identifier: String,
    pub platform: Platform,
    pub trust: TrustLevel,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// The contract consumed by the inbound pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub allowed: bool,
    pub trust: Option<TrustLevel>,
    pub reason: String,
}

pub struct ContactRegistry {
    pool: SqlitePool,
}

impl ContactRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update a contact. On conflict, `trust` is overwritten
    /// unconditionally; `name`/`notes` are updated only when the caller
    /// supplies a non-empty value (preserve-on-null policy).
    pub async fn upsert(
        &self,
        identifier: &str,
        platform: Platform,
        trust: TrustLevel,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> WaspResult<Contact> {
        if identifier.is_empty() {
            return Err(WaspError::InvalidInput(
                "identifier must not be empty".into(),
            ));
        }

        let existing = self.get(identifier, platform).await?;
        let now = crate::util::now_iso8601();

        match existing {
            Some(row) => {
                let new_name = match name {
                    Some(n) if !n.is_empty() => Some(n.to_string()),
                    _ => row.name,
                };
                let new_notes = match notes {
                    Some(n) if !n.is_empty() => Some(n.to_string()),
                    _ => row.notes,
                };
                sqlx::query(
                    "UPDATE contacts SET trust = ?, name = ?, notes = ? \
                     WHERE identifier = ? AND platform = ?",
                )
                .bind(trust.as_str())
                .bind(&new_name)
                .bind(&new_notes)
                .bind(identifier)
                .bind(platform.as_str())
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO contacts (identifier, platform, trust, name, notes, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(identifier)
                .bind(platform.as_str())
                .bind(trust.as_str())
                .bind(name.filter(|n| !n.is_empty()))
                .bind(notes.filter(|n| !n.is_empty()))
                .bind(&now)
                .execute(&self.pool)
                .await?;
            }
        }

        self.get(identifier, platform)
            .await?
            .ok_or_else(|| WaspError::NotFound(format!("contact {identifier}/{platform}")))
    }

    /// Returns `true` iff a row was deleted.
    pub async fn remove(&self, identifier: &str, platform: Platform) -> WaspResult<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE identifier = ? AND platform = ?")
            .bind(identifier)
            .bind(platform.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, identifier: &str, platform: Platform) -> WaspResult<Option<Contact>> {
        let row = sqlx::query(
            "SELECT id, identifier, platform, trust, name, notes, created_at \
             FROM contacts WHERE identifier = ? AND platform = ?",
        )
        .bind(identifier)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_contact).transpose()
    }

    /// Ordered newest-first by creation time.
    pub async fn list(
        &self,
        platform_filter: Option<Platform>,
        trust_filter: Option<TrustLevel>,
    ) -> WaspResult<Vec<Contact>> {
        let rows = sqlx::query(
            "SELECT id, identifier, platform, trust, name, notes, created_at \
             FROM contacts \
             WHERE (?1 IS NULL OR platform = ?1) AND (?2 IS NULL OR trust = ?2) \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(platform_filter.map(|p| p.as_str()))
        .bind(trust_filter.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_contact).collect()
    }

    /// The decision contract consumed by the inbound pipeline.
    ///
    /// Identifiers are compared byte-exact: no case-folding, whitespace
    /// trimming, or Unicode normalization. This is deliberate — a
    /// confusable-normalization scheme would only enlarge the attack
    /// surface a whitelist is meant to shrink.
    pub async fn check(&self, identifier: &str, platform: Platform) -> WaspResult<CheckResult> {
        match self.get(identifier, platform).await? {
            None => Ok(CheckResult {
                allowed: false,
                trust: None,
                reason: "Contact not in whitelist".to_string(),
            }),
            Some(contact) if contact.trust == TrustLevel::Limited => Ok(CheckResult {
                allowed: true,
                trust: Some(TrustLevel::Limited),
                reason: "Limited trust — agent may view but should not act".to_string(),
            }),
            Some(contact) => Ok(CheckResult {
                allowed: true,
                trust: Some(contact.trust),
                reason: "Contact is trusted".to_string(),
            }),
        }
    }

    fn row_to_contact(row: sqlx::sqlite::SqliteRow) -> WaspResult<Contact> {
        let platform_str: String = row.try_get("platform")?;
        let trust_str: String = row.try_get("trust")?;
        Ok(Contact {
            id: row.try_get("id")?,
            identifier: row.try_get("identifier")?,
            platform: platform_str.parse()?,
            trust: trust_str.parse()?,
            name: row.try_get("name")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    async fn registry() -> (tempfile::TempDir, ContactRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();
        (dir, ContactRegistry::new(storage.pool().clone()))
    }

    #[tokio::test]
    async fn check_unknown_sender_denies() {
        let (_dir, reg) = registry().await;
        let result = reg.check("+4409", Platform::Whatsapp).await.unwrap();
        assert!(!result.allowed);
        assert_eq!(result.trust, None);
        assert_eq!(result.reason, "Contact not in whitelist");
    }

    #[tokio::test]
    async fn check_limited_allows_with_limited_reason() {
        let (_dir, reg) = registry().await;
        reg.upsert("+4402", Platform::Whatsapp, TrustLevel::Limited, None, None)
            .await
            .unwrap();
        let result = reg.check("+4402", Platform::Whatsapp).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.trust, Some(TrustLevel::Limited));
        assert!(result.reason.contains("Limited trust"));
    }

    #[tokio::test]
    async fn check_trusted_and_sovereign_allow() {
        let (_dir, reg) = registry().await;
        reg.upsert(
            "+4401",
            Platform::Whatsapp,
            TrustLevel::Sovereign,
            None,
            None,
        )
        .await
        .unwrap();
        let result = reg.check("+4401", Platform::Whatsapp).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.trust, Some(TrustLevel::Sovereign));
        assert_eq!(result.reason, "Contact is trusted");
    }

    #[tokio::test]
    async fn upsert_then_get_preserves_last_trust() {
        let (_dir, reg) = registry().await;
        reg.upsert("a", Platform::Email, TrustLevel::Limited, None, None)
            .await
            .unwrap();
        reg.upsert("a", Platform::Email, TrustLevel::Trusted, None, None)
            .await
            .unwrap();
        let got = reg.get("a", Platform::Email).await.unwrap().unwrap();
        assert_eq!(got.trust, TrustLevel::Trusted);
    }

    #[tokio::test]
    async fn upsert_preserves_name_and_notes_on_empty_overwrite() {
        let (_dir, reg) = registry().await;
        reg.upsert(
            "a",
            Platform::Email,
            TrustLevel::Limited,
            Some("Alice"),
            Some("vip"),
        )
        .await
        .unwrap();
        reg.upsert("a", Platform::Email, TrustLevel::Trusted, Some(""), Some(""))
            .await
            .unwrap();
        let got = reg.get("a", Platform::Email).await.unwrap().unwrap();
        assert_eq!(got.name.as_deref(), Some("Alice"));
        assert_eq!(got.notes.as_deref(), Some("vip"));
        assert_eq!(got.trust, TrustLevel::Trusted);
    }

    #[tokio::test]
    async fn upsert_updates_name_when_nonempty() {
        let (_dir, reg) = registry().await;
        reg.upsert("a", Platform::Email, TrustLevel::Limited, Some("Alice"), None)
            .await
            .unwrap();
        reg.upsert("a", Platform::Email, TrustLevel::Limited, Some("Bob"), None)
            .await
            .unwrap();
        let got = reg.get("a", Platform::Email).await.unwrap().unwrap();
        assert_eq!(got.name.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn remove_returns_true_iff_row_deleted() {
        let (_dir, reg) = registry().await;
        reg.upsert("a", Platform::Email, TrustLevel::Limited, None, None)
            .await
            .unwrap();
        assert!(reg.remove("a", Platform::Email).await.unwrap());
        assert!(!reg.remove("a", Platform::Email).await.unwrap());
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let (_dir, reg) = registry().await;
        reg.upsert("a", Platform::Email, TrustLevel::Limited, None, None)
            .await
            .unwrap();
        reg.upsert("b", Platform::Email, TrustLevel::Limited, None, None)
            .await
            .unwrap();
        let contacts = reg.list(None, None).await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].identifier, "b");
    }

    #[tokio::test]
    async fn list_filters_by_platform_and_trust() {
        let (_dir, reg) = registry().await;
        reg.upsert("a", Platform::Email, TrustLevel::Limited, None, None)
            .await
            .unwrap();
        reg.upsert(
            "b",
            Platform::Whatsapp,
            TrustLevel::Sovereign,
            None,
            None,
        )
        .await
        .unwrap();
        let only_email = reg.list(Some(Platform::Email), None).await.unwrap();
        assert_eq!(only_email.len(), 1);
        assert_eq!(only_email[0].identifier, "a");

        let only_sovereign = reg.list(None, Some(TrustLevel::Sovereign)).await.unwrap();
        assert_eq!(only_sovereign.len(), 1);
        assert_eq!(only_sovereign[0].identifier, "b");
    }

    #[tokio::test]
    async fn identifier_matching_is_byte_exact() {
        let (_dir, reg) = registry().await;
        reg.upsert("Alice", Platform::Email, TrustLevel::Trusted, None, None)
            .await
            .unwrap();
        let padded = reg.check(" Alice", Platform::Email).await.unwrap();
        assert!(!padded.allowed, "leading whitespace must not match");
        let cased = reg.check("alice", Platform::Email).await.unwrap();
        assert!(!cased.allowed, "case folding must not occur");
    }

    #[tokio::test]
    async fn unique_per_identifier_and_platform() {
        let (_dir, reg) = registry().await;
        reg.upsert("a", Platform::Email, TrustLevel::Limited, None, None)
            .await
            .unwrap();
        reg.upsert("a", Platform::Whatsapp, TrustLevel::Trusted, None, None)
            .await
            .unwrap();
        let contacts = reg.list(None, None).await.unwrap();
        assert_eq!(contacts.len(), 2);
    }

    #[tokio::test]
    async fn empty_identifier_is_rejected() {
        let (_dir, reg) = registry().await;
        let err = reg
            .upsert("", Platform::Email, TrustLevel::Limited, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WaspError::InvalidInput(_)));
    }
}
