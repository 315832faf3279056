//! Embedded relational store: schema, connection lifecycle, migrations.
//!
//! Opens a `SqlitePool` against a file URL, runs an idempotent migration
//! script, and best-effort `ALTER TABLE`s an older schema forward.

use std::path::Path;

use sqlx::SqlitePool;

use crate::error::WaspResult;

const MIGRATE: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier  TEXT    NOT NULL,
    platform    TEXT    NOT NULL,
    trust       TEXT    NOT NULL,
    name        TEXT,
    notes       TEXT,
    created_at  TEXT    NOT NULL,
    UNIQUE(identifier, platform)
);

CREATE TABLE IF NOT EXISTS audit_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp   TEXT    NOT NULL,
    identifier  TEXT    NOT NULL,
    platform    TEXT,
    decision    TEXT    NOT NULL,
    reason      TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS quarantine (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier  TEXT    NOT NULL,
    platform    TEXT    NOT NULL,
    preview     TEXT    NOT NULL,
    body        TEXT    NOT NULL,
    created_at  TEXT    NOT NULL,
    reviewed    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS injection_telemetry (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier  TEXT    NOT NULL,
    platform    TEXT    NOT NULL,
    score       REAL    NOT NULL,
    patterns    TEXT    NOT NULL,
    verbs       TEXT    NOT NULL,
    preview     TEXT    NOT NULL,
    timestamp   TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
CREATE INDEX IF NOT EXISTS idx_quarantine_identifier ON quarantine(identifier, platform);
CREATE INDEX IF NOT EXISTS idx_telemetry_timestamp ON injection_telemetry(timestamp);
"#;

const SCHEMA_VERSION: &str = "1";

/// Owns the embedded database connection. All mutating calls run as their
/// own transaction via sqlx's per-statement autocommit.
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Opens (creating if necessary) the database file under `data_dir`
    /// and ensures the schema. Idempotent: calling this again against an
    /// already-initialized store is a no-op beyond the `CREATE TABLE IF
    /// NOT EXISTS` / `INSERT OR IGNORE` statements it issues.
    pub async fn open(data_dir: &Path) -> WaspResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            crate::error::WaspError::StorageFailure(Box::new(sqlx::Error::Io(e)))
        })?;
        let db_path = data_dir.join("wasp.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePool::connect(&url).await?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query(MIGRATE).execute(&pool).await?;
        sqlx::query("INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?)")
            .bind(SCHEMA_VERSION)
            .execute(&pool)
            .await?;
        // One stable identifier per store, generated on first open and
        // never regenerated — distinguishes audit/telemetry exports from
        // different installs without leaking anything about the host.
        sqlx::query("INSERT OR IGNORE INTO meta (key, value) VALUES ('instance_id', ?)")
            .bind(uuid::Uuid::new_v4().to_string())
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    /// The store's stable per-install identifier, generated on first
    /// `open()`. Present for every initialized store.
    pub async fn instance_id(&self) -> WaspResult<String> {
        let row: (String,) =
            sqlx::query_as("SELECT value FROM meta WHERE key = 'instance_id'")
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the underlying connection pool. A subsequent `open()`
    /// against the same directory is valid.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
