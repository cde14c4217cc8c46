use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

lazy_static! {
    static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex");
}

/// Lowercase ASCII words joined by single hyphens
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// A gallery category images are filed under
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// URL-safe identifier, unique across categories
    pub slug: String,
    pub description: Option<String>,
    /// Manual position in listings (ascending)
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new category
#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

/// Request to update an existing category
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("category not found")]
    NotFound,
    #[error("Category with slug '{0}' already exists")]
    SlugTaken(String),
    #[error("Slug '{0}' may only contain lowercase letters, numbers and single hyphens")]
    InvalidSlug(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Category {
    /// All categories in manual order
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"SELECT id, name, slug, description, sort_order, created_at, updated_at
            FROM categories
            ORDER BY sort_order ASC, created_at ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"SELECT id, name, slug, description, sort_order, created_at, updated_at
            FROM categories
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"SELECT id, name, slug, description, sort_order, created_at, updated_at
            FROM categories
            WHERE slug = $1"#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Resolve a set of ids, preserving the caller's order. Unknown ids are skipped.
    pub async fn find_many(pool: &SqlitePool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(category) = Self::find_by_id(pool, *id).await? {
                found.push(category);
            }
        }
        Ok(found)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(pool)
            .await
    }

    /// Create a new category.
    ///
    /// The slug check is a plain read before the insert, so two concurrent
    /// creates with the same slug can both succeed.
    pub async fn create(pool: &SqlitePool, data: &CreateCategory) -> Result<Self, CategoryError> {
        if !is_valid_slug(&data.slug) {
            return Err(CategoryError::InvalidSlug(data.slug.clone()));
        }
        if Self::find_by_slug(pool, &data.slug).await?.is_some() {
            return Err(CategoryError::SlugTaken(data.slug.clone()));
        }

        let id = Uuid::new_v4();
        let category = sqlx::query_as::<_, Category>(
            r#"INSERT INTO categories (id, name, slug, description, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, slug, description, sort_order, created_at, updated_at"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.slug)
        .bind(data.description.as_deref())
        .bind(data.sort_order)
        .fetch_one(pool)
        .await?;

        Ok(category)
    }

    /// Update an existing category; absent fields keep their stored value
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateCategory,
    ) -> Result<Self, CategoryError> {
        if let Some(slug) = data.slug.as_deref().filter(|slug| !is_valid_slug(slug)) {
            return Err(CategoryError::InvalidSlug(slug.to_string()));
        }
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(CategoryError::NotFound)?;

        let name = data.name.as_ref().unwrap_or(&existing.name);
        let slug = data.slug.as_ref().unwrap_or(&existing.slug);
        let description = data.description.as_ref().or(existing.description.as_ref());
        let sort_order = data.sort_order.unwrap_or(existing.sort_order);

        let mut tx = pool.begin().await?;

        let updated = sqlx::query_as::<_, Category>(
            r#"UPDATE categories
            SET name = $2, slug = $3, description = $4, sort_order = $5,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1
            RETURNING id, name, slug, description, sort_order, created_at, updated_at"#,
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(sort_order)
        .fetch_one(&mut *tx)
        .await?;

        if updated.slug != existing.slug {
            sqlx::query("UPDATE image_categories SET category_slug = $2 WHERE category_id = $1")
                .bind(id)
                .bind(&updated.slug)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Hard delete. Images filed under the category are left as they are.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_shape() {
        assert!(is_valid_slug("interiors"));
        assert!(is_valid_slug("street-2024"));
        assert!(!is_valid_slug("Street Shots/2024"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug(""));
    }
}
