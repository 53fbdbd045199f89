//! Application state for the contractsign API

use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;

pub struct AppState {
    pub db: SqlitePool,
    /// Refuse to send contracts whose signers lack a signature field
    pub enforce_readiness: bool,
}

impl AppState {
    pub async fn connect(database_url: &str, enforce_readiness: bool) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        // Every connection to an in-memory database is a separate database
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(database_url)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?
        };

        Self::run_migrations(&pool).await?;

        Ok(Self {
            db: pool,
            enforce_readiness,
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contracts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                contract_id TEXT NOT NULL REFERENCES contracts(id),
                filename TEXT NOT NULL,
                original_path TEXT NOT NULL,
                page_count INTEGER NOT NULL,
                sort_order INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signers (
                id TEXT PRIMARY KEY,
                contract_id TEXT NOT NULL REFERENCES contracts(id),
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                signer_type TEXT NOT NULL DEFAULT 'signer',
                sort_order INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        // position and size hold the JSON-encoded strings exactly as they travel
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fields (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL REFERENCES documents(id),
                signer_id TEXT,
                field_type TEXT NOT NULL,
                pages TEXT NOT NULL,
                position TEXT NOT NULL,
                size TEXT NOT NULL,
                content TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_documents_contract ON documents(contract_id)
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_fields_document ON fields(document_id)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }
}

/// `sqlite:` URL under the platform data directory
pub fn default_database_url() -> String {
    let data_dir = data_dir(|key| std::env::var(key).ok());
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::warn!("Could not create {}: {}", data_dir.display(), e);
    }
    format!("sqlite:{}/contractsign.db?mode=rwc", data_dir.display())
}

/// Directory holding the database. `CONTRACTSIGN_DATA_DIR` wins; otherwise the
/// platform data directory, falling back to the working directory.
fn data_dir(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = env("CONTRACTSIGN_DATA_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    let platform = if cfg!(target_os = "windows") {
        env("APPDATA").map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        env("HOME").map(|h| PathBuf::from(h).join("Library/Application Support"))
    } else {
        env("XDG_DATA_HOME")
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .or_else(|| env("HOME").map(|h| PathBuf::from(h).join(".local/share")))
    };

    platform
        .map(|root| root.join("contractsign-api"))
        .unwrap_or_else(|| PathBuf::from("."))
}
