use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, Default)]
#[sqlx(type_name = "contact_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Replied,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}

/// A submission that has already passed validation
#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default, alias = "projectType")]
    pub project_type: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
}

impl ContactMessage {
    /// Newest first
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"SELECT id, name, email, subject, message, project_type, budget, status, created_at
            FROM contact_messages
            ORDER BY created_at DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"SELECT id, name, email, subject, message, project_type, budget, status, created_at
            FROM contact_messages
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateContactMessage,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, ContactMessage>(
            r#"INSERT INTO contact_messages
                (id, name, email, subject, message, project_type, budget, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, email, subject, message, project_type, budget, status, created_at"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.subject)
        .bind(&data.message)
        .bind(data.project_type.as_deref())
        .bind(data.budget.as_deref())
        .bind(ContactStatus::New)
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: ContactStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"UPDATE contact_messages SET status = $2
            WHERE id = $1
            RETURNING id, name, email, subject, message, project_type, budget, status, created_at"#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
