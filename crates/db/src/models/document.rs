//! Singleton JSON documents (site configuration, profile) keyed by name.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};

pub const SITE_CONFIG: &str = "site_config";
pub const PROFILE: &str = "profile";

#[derive(Debug, Clone, FromRow)]
struct DocumentRow {
    body: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub body: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("stored document '{0}' is not valid JSON: {1}")]
    Corrupt(String, serde_json::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl Document {
    fn from_row(name: &str, row: DocumentRow) -> Result<Self, DocumentError> {
        let body = serde_json::from_str(&row.body)
            .map_err(|e| DocumentError::Corrupt(name.to_string(), e))?;
        Ok(Document {
            name: name.to_string(),
            body,
            updated_at: row.updated_at,
        })
    }

    pub async fn get(pool: &SqlitePool, name: &str) -> Result<Option<Self>, DocumentError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT body, updated_at FROM documents WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;
        row.map(|row| Self::from_row(name, row)).transpose()
    }

    /// Insert `body` unless a document with this name exists, then return
    /// whatever is stored
    pub async fn insert_if_absent(
        pool: &SqlitePool,
        name: &str,
        body: &Value,
    ) -> Result<Self, DocumentError> {
        sqlx::query("INSERT OR IGNORE INTO documents (name, body) VALUES ($1, $2)")
            .bind(name)
            .bind(serde_json::to_string(body)?)
            .execute(pool)
            .await?;
        Self::get(pool, name)
            .await?
            .ok_or(DocumentError::Database(sqlx::Error::RowNotFound))
    }

    pub async fn upsert(pool: &SqlitePool, name: &str, body: &Value) -> Result<Self, DocumentError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"INSERT INTO documents (name, body) VALUES ($1, $2)
            ON CONFLICT(name) DO UPDATE SET
                body = excluded.body,
                updated_at = datetime('now', 'subsec')
            RETURNING body, updated_at"#,
        )
        .bind(name)
        .bind(serde_json::to_string(body)?)
        .fetch_one(pool)
        .await?;
        Self::from_row(name, row)
    }
}
