use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Fallback dimensions when the uploaded file's header can't be read
pub const DEFAULT_WIDTH: i64 = 1200;
pub const DEFAULT_HEIGHT: i64 = 800;

/// Default number of featured images returned by the homepage query
pub const DEFAULT_FEATURED_LIMIT: i64 = 12;

/// Category membership as found in stored documents.
///
/// Older records carry a single `categoryId`/`categorySlug` pair, newer ones
/// carry parallel `categoryIds`/`categorySlugs` arrays. Both shapes
/// deserialize into this type and are consumed through [`CategoryMembership::links`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
pub enum CategoryMembership {
    Many {
        #[serde(default, alias = "categoryIds")]
        category_ids: Vec<String>,
        #[serde(alias = "categorySlugs")]
        category_slugs: Vec<String>,
    },
    Single {
        #[serde(default, alias = "categoryId")]
        category_id: Option<String>,
        #[serde(alias = "categorySlug")]
        category_slug: String,
    },
}

/// One normalized membership entry. `id` is absent when a legacy record only
/// stored the slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipLink<'a> {
    pub id: Option<&'a str>,
    pub slug: &'a str,
}

impl CategoryMembership {
    pub fn single(slug: impl Into<String>) -> Self {
        CategoryMembership::Single {
            category_id: None,
            category_slug: slug.into(),
        }
    }

    pub fn many<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategoryMembership::Many {
            category_ids: Vec::new(),
            category_slugs: slugs.into_iter().map(Into::into).collect(),
        }
    }

    /// Ordered links, primary category first. Empty slugs are dropped.
    pub fn links(&self) -> Vec<MembershipLink<'_>> {
        match self {
            CategoryMembership::Single {
                category_id,
                category_slug,
            } => {
                if category_slug.is_empty() {
                    Vec::new()
                } else {
                    vec![MembershipLink {
                        id: category_id.as_deref(),
                        slug: category_slug,
                    }]
                }
            }
            CategoryMembership::Many {
                category_ids,
                category_slugs,
            } => category_slugs
                .iter()
                .enumerate()
                .filter(|(_, slug)| !slug.is_empty())
                .map(|(i, slug)| MembershipLink {
                    id: category_ids.get(i).map(String::as_str),
                    slug,
                })
                .collect(),
        }
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.links().iter().any(|link| link.slug == slug)
    }

    pub fn is_empty(&self) -> bool {
        self.links().is_empty()
    }
}

/// A resolved category reference attached to an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct CategoryLink {
    pub category_id: Uuid,
    pub category_slug: String,
}

/// A portfolio image with its category memberships, primary category first
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Image {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Public URL returned by the storage backend
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub width: i64,
    pub height: i64,
    pub sort_order: i64,
    pub featured: bool,
    pub category_ids: Vec<Uuid>,
    pub category_slugs: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ImageRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    location: Option<String>,
    url: String,
    thumbnail_url: Option<String>,
    width: i64,
    height: i64,
    sort_order: i64,
    featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    image_id: Uuid,
    category_id: Uuid,
    category_slug: String,
}

impl ImageRow {
    fn into_image(self, links: Vec<CategoryLink>) -> Image {
        let (category_ids, category_slugs) = links
            .into_iter()
            .map(|link| (link.category_id, link.category_slug))
            .unzip();
        Image {
            id: self.id,
            title: self.title,
            description: self.description,
            location: self.location,
            url: self.url,
            thumbnail_url: self.thumbnail_url,
            width: self.width,
            height: self.height,
            sort_order: self.sort_order,
            featured: self.featured,
            category_ids,
            category_slugs,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Request to create an image record. Category links must already be resolved
/// against stored categories.
#[derive(Debug, Clone)]
pub struct CreateImage {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub width: i64,
    pub height: i64,
    pub sort_order: i64,
    pub featured: bool,
    pub categories: Vec<CategoryLink>,
}

/// Partial update; `categories` replaces the full membership list when present
#[derive(Debug, Clone, Default)]
pub struct UpdateImage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub sort_order: Option<i64>,
    pub featured: Option<bool>,
    pub categories: Option<Vec<CategoryLink>>,
}

const IMAGE_COLUMNS: &str = "i.id, i.title, i.description, i.location, i.url, i.thumbnail_url, \
     i.width, i.height, i.sort_order, i.featured, i.created_at, i.updated_at";

impl Image {
    pub fn primary_category_slug(&self) -> Option<&str> {
        self.category_slugs.first().map(String::as_str)
    }

    /// Load memberships for the given rows and assemble full images
    async fn with_memberships(
        pool: &SqlitePool,
        rows: Vec<ImageRow>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT image_id, category_id, category_slug FROM image_categories WHERE image_id IN (",
        );
        let mut separated = builder.separated(", ");
        for row in &rows {
            separated.push_bind(row.id);
        }
        separated.push_unseparated(") ORDER BY image_id, position ASC");

        let memberships = builder
            .build_query_as::<MembershipRow>()
            .fetch_all(pool)
            .await?;

        let mut by_image: HashMap<Uuid, Vec<CategoryLink>> = HashMap::new();
        for membership in memberships {
            by_image
                .entry(membership.image_id)
                .or_default()
                .push(CategoryLink {
                    category_id: membership.category_id,
                    category_slug: membership.category_slug,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let links = by_image.remove(&row.id).unwrap_or_default();
                row.into_image(links)
            })
            .collect())
    }

    /// All images in manual order
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images i ORDER BY i.sort_order ASC, i.created_at ASC"
        ))
        .fetch_all(pool)
        .await?;
        Self::with_memberships(pool, rows).await
    }

    /// Images filed under `category_slug` (at any membership position)
    pub async fn find_by_category(
        pool: &SqlitePool,
        category_slug: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images i
            WHERE EXISTS (
                SELECT 1 FROM image_categories ic
                WHERE ic.image_id = i.id AND ic.category_slug = $1
            )
            ORDER BY i.sort_order ASC, i.created_at ASC"
        ))
        .bind(category_slug)
        .fetch_all(pool)
        .await?;
        Self::with_memberships(pool, rows).await
    }

    /// Featured images in manual order, at most `limit`. A limit of zero or
    /// less returns every featured image.
    pub async fn find_featured(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images i
            WHERE i.featured = 1
            ORDER BY i.sort_order ASC, i.created_at ASC
            LIMIT $1"
        ))
        .bind(if limit > 0 { limit } else { -1 })
        .fetch_all(pool)
        .await?;
        Self::with_memberships(pool, rows).await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images i WHERE i.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => Ok(Self::with_memberships(pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Number of images filed under `category_slug`
    pub async fn count_in_category(
        pool: &SqlitePool,
        category_slug: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT image_id) FROM image_categories WHERE category_slug = $1",
        )
        .bind(category_slug)
        .fetch_one(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images")
            .fetch_one(pool)
            .await
    }

    /// Create an image and its memberships in one transaction
    pub async fn create(pool: &SqlitePool, data: &CreateImage) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO images
                (id, title, description, location, url, thumbnail_url, width, height, sort_order, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(data.description.as_deref())
        .bind(data.location.as_deref())
        .bind(&data.url)
        .bind(data.thumbnail_url.as_deref())
        .bind(data.width)
        .bind(data.height)
        .bind(data.sort_order)
        .bind(data.featured)
        .execute(&mut *tx)
        .await?;

        insert_memberships(&mut tx, id, &data.categories).await?;
        tx.commit().await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Update an existing image; absent fields keep their stored value
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateImage,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let title = data.title.as_ref().unwrap_or(&existing.title);
        let description = data.description.as_ref().or(existing.description.as_ref());
        let location = data.location.as_ref().or(existing.location.as_ref());
        let url = data.url.as_ref().unwrap_or(&existing.url);
        let thumbnail_url = data
            .thumbnail_url
            .as_ref()
            .or(existing.thumbnail_url.as_ref());
        let width = data.width.unwrap_or(existing.width);
        let height = data.height.unwrap_or(existing.height);
        let sort_order = data.sort_order.unwrap_or(existing.sort_order);
        let featured = data.featured.unwrap_or(existing.featured);

        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"UPDATE images
            SET title = $2, description = $3, location = $4, url = $5, thumbnail_url = $6,
                width = $7, height = $8, sort_order = $9, featured = $10,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1"#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(location)
        .bind(url)
        .bind(thumbnail_url)
        .bind(width)
        .bind(height)
        .bind(sort_order)
        .bind(featured)
        .execute(&mut *tx)
        .await?;

        if let Some(categories) = &data.categories {
            sqlx::query("DELETE FROM image_categories WHERE image_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_memberships(&mut tx, id, categories).await?;
        }

        tx.commit().await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update_order(
        pool: &SqlitePool,
        id: Uuid,
        sort_order: i64,
    ) -> Result<Self, sqlx::Error> {
        let data = UpdateImage {
            sort_order: Some(sort_order),
            ..Default::default()
        };
        Self::update(pool, id, &data).await
    }

    pub async fn set_featured(
        pool: &SqlitePool,
        id: Uuid,
        featured: bool,
    ) -> Result<Self, sqlx::Error> {
        let data = UpdateImage {
            featured: Some(featured),
            ..Default::default()
        };
        Self::update(pool, id, &data).await
    }

    /// Hard delete; memberships go with the image
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

async fn insert_memberships(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    image_id: Uuid,
    categories: &[CategoryLink],
) -> Result<(), sqlx::Error> {
    for (position, link) in categories.iter().enumerate() {
        sqlx::query(
            r#"INSERT OR IGNORE INTO image_categories (image_id, category_id, category_slug, position)
            VALUES ($1, $2, $3, $4)"#,
        )
        .bind(image_id)
        .bind(link.category_id)
        .bind(&link.category_slug)
        .bind(position as i64)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_legacy_shape_deserializes() {
        let membership: CategoryMembership =
            serde_json::from_str(r#"{"categoryId":"abc","categorySlug":"interiors"}"#).unwrap();
        assert_eq!(
            membership.links(),
            vec![MembershipLink {
                id: Some("abc"),
                slug: "interiors"
            }]
        );
    }

    #[test]
    fn plural_legacy_shape_deserializes() {
        let membership: CategoryMembership = serde_json::from_str(
            r#"{"categoryIds":["1","2"],"categorySlugs":["interiors","exteriors"]}"#,
        )
        .unwrap();
        assert!(membership.contains_slug("interiors"));
        assert!(membership.contains_slug("exteriors"));
        assert_eq!(membership.links()[1].id, Some("2"));
    }

    #[test]
    fn plural_shape_wins_when_both_are_present() {
        let membership: CategoryMembership = serde_json::from_str(
            r#"{"categorySlug":"interiors","categorySlugs":["travel","interiors"]}"#,
        )
        .unwrap();
        assert_eq!(membership.links()[0].slug, "travel");
    }

    #[test]
    fn empty_slugs_count_as_no_membership() {
        assert!(CategoryMembership::many(Vec::<String>::new()).is_empty());
        assert!(CategoryMembership::single("").is_empty());
        assert!(!CategoryMembership::single("a").contains_slug("b"));
    }
}
