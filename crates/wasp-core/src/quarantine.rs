//! Hold-and-review lifecycle for blocked inbound messages.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::contacts::Platform;
use crate::error::WaspResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantinedMessage {
    pub id: i64,
    pub identifier: String,
    pub platform: Platform,
    pub preview: String,
    pub body: String,
    pub created_at: String,
    pub reviewed: bool,
}

/// Truncates `body` to at most `max_chars` characters, appending an
/// ellipsis when truncated. Operates on `char` boundaries, not bytes, so
/// multi-byte UTF-8 content is never split mid-codepoint.
fn truncate_preview(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let truncated: String = body.chars().take(max_chars).collect();
    format!("{truncated}...")
}

pub struct Quarantine {
    pool: SqlitePool,
    preview_chars: usize,
}

impl Quarantine {
    pub fn new(pool: SqlitePool, preview_chars: usize) -> Self {
        Self { pool, preview_chars }
    }

    pub async fn quarantine(
        &self,
        identifier: &str,
        platform: Platform,
        message: &str,
    ) -> WaspResult<QuarantinedMessage> {
        let preview = truncate_preview(message, self.preview_chars);
        let now = crate::util::now_iso8601();

        let result = sqlx::query(
            "INSERT INTO quarantine (identifier, platform, preview, body, created_at, reviewed) \
             VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(identifier)
        .bind(platform.as_str())
        .bind(&preview)
        .bind(message)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(QuarantinedMessage {
            id: result.last_insert_rowid(),
            identifier: identifier.to_string(),
            platform,
            preview,
            body: message.to_string(),
            created_at: now,
            reviewed: false,
        })
    }

    pub async fn list_unreviewed(&self, limit: u32) -> WaspResult<Vec<QuarantinedMessage>> {
        let rows = sqlx::query(
            "SELECT id, identifier, platform, preview, body, created_at, reviewed \
             FROM quarantine WHERE reviewed = 0 ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_message).collect()
    }

    pub async fn list_by_identifier(
        &self,
        identifier: &str,
        platform: Platform,
    ) -> WaspResult<Vec<QuarantinedMessage>> {
        let rows = sqlx::query(
            "SELECT id, identifier, platform, preview, body, created_at, reviewed \
             FROM quarantine WHERE identifier = ? AND platform = ? ORDER BY id DESC",
        )
        .bind(identifier)
        .bind(platform.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_message).collect()
    }

    /// Marks all unreviewed messages for `(identifier, platform)` reviewed
    /// and returns the messages that were just released. Does not delete.
    /// Calling this again for an already-released identifier returns an
    /// empty list and performs no mutation.
    pub async fn release(
        &self,
        identifier: &str,
        platform: Platform,
    ) -> WaspResult<Vec<QuarantinedMessage>> {
        let rows = sqlx::query(
            "SELECT id, identifier, platform, preview, body, created_at, reviewed \
             FROM quarantine WHERE identifier = ? AND platform = ? AND reviewed = 0 \
             ORDER BY id DESC",
        )
        .bind(identifier)
        .bind(platform.as_str())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query(
            "UPDATE quarantine SET reviewed = 1 WHERE identifier = ? AND platform = ? AND reviewed = 0",
        )
        .bind(identifier)
        .bind(platform.as_str())
        .execute(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                // `reviewed` reads back as 0 from the pre-update snapshot;
                // the returned value reflects the post-release state.
                let msg = Self::row_to_message(row)?;
                Ok(QuarantinedMessage {
                    reviewed: true,
                    ..msg
                })
            })
            .collect()
    }

    pub async fn delete(&self, identifier: &str, platform: Platform) -> WaspResult<u64> {
        let result = sqlx::query("DELETE FROM quarantine WHERE identifier = ? AND platform = ?")
            .bind(identifier)
            .bind(platform.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_older_than(&self, days: i64) -> WaspResult<u64> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(days);
        let result = sqlx::query("DELETE FROM quarantine WHERE created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn row_to_message(row: sqlx::sqlite::SqliteRow) -> WaspResult<QuarantinedMessage> {
        let platform_str: String = row.try_get("platform")?;
        let reviewed: i64 = row.try_get("reviewed")?;
        Ok(QuarantinedMessage {
            id: row.try_get("id")?,
            identifier: row.try_get("identifier")?,
            platform: platform_str.parse()?,
            preview: row.try_get("preview")?,
            body: row.try_get("body")?,
            created_at: row.try_get("created_at")?,
            reviewed: reviewed != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    async fn quarantine() -> (tempfile::TempDir, Quarantine) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();
        (dir, Quarantine::new(storage.pool().clone(), 100))
    }

    #[test]
    fn preview_truncates_long_body_with_ellipsis() {
        let body = "a".repeat(250);
        let preview = truncate_preview(&body, 100);
        assert_eq!(preview.len(), 103);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn preview_leaves_short_body_untouched() {
        let preview = truncate_preview("hello", 100);
        assert_eq!(preview, "hello");
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let body = "é".repeat(150);
        let preview = truncate_preview(&body, 100);
        assert_eq!(preview.chars().filter(|c| *c == 'é').count(), 100);
        assert!(preview.ends_with("..."));
    }

    #[tokio::test]
    async fn quarantine_then_release_then_release_again() {
        let (_dir, q) = quarantine().await;
        q.quarantine("+4409", Platform::Whatsapp, "body text")
            .await
            .unwrap();

        let released = q.release("+4409", Platform::Whatsapp).await.unwrap();
        assert_eq!(released.len(), 1);
        assert!(released[0].reviewed);

        let second = q.release("+4409", Platform::Whatsapp).await.unwrap();
        assert!(second.is_empty(), "second release must be a no-op");
    }

    #[tokio::test]
    async fn list_unreviewed_excludes_released() {
        let (_dir, q) = quarantine().await;
        q.quarantine("a", Platform::Email, "msg1").await.unwrap();
        q.quarantine("b", Platform::Email, "msg2").await.unwrap();
        q.release("a", Platform::Email).await.unwrap();

        let unreviewed = q.list_unreviewed(10).await.unwrap();
        assert_eq!(unreviewed.len(), 1);
        assert_eq!(unreviewed[0].identifier, "b");
    }

    #[tokio::test]
    async fn list_by_identifier_returns_all_states() {
        let (_dir, q) = quarantine().await;
        q.quarantine("a", Platform::Email, "msg1").await.unwrap();
        q.release("a", Platform::Email).await.unwrap();
        let all = q.list_by_identifier("a", Platform::Email).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].reviewed);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let (_dir, q) = quarantine().await;
        q.quarantine("a", Platform::Email, "msg1").await.unwrap();
        let deleted = q.delete("a", Platform::Email).await.unwrap();
        assert_eq!(deleted, 1);
        let all = q.list_by_identifier("a", Platform::Email).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn delete_works_from_either_pre_terminal_state() {
        let (_dir, q) = quarantine().await;
        q.quarantine("a", Platform::Email, "msg1").await.unwrap();
        q.release("a", Platform::Email).await.unwrap();
        let deleted = q.delete("a", Platform::Email).await.unwrap();
        assert_eq!(deleted, 1, "delete must work on an already-reviewed row");
    }
}
