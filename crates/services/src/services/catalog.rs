//! Category membership resolution shared by image writes and uploads.

use db::models::{category::Category, image::CategoryLink};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("At least one category is required")]
    NoCategories,
    #[error("Category '{0}' does not exist")]
    UnknownCategory(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Parse client supplied category identifiers
pub fn parse_category_ids<S: AsRef<str>>(values: &[S]) -> Result<Vec<Uuid>, CatalogError> {
    values
        .iter()
        .map(|value| {
            let value = value.as_ref().trim();
            Uuid::parse_str(value).map_err(|_| CatalogError::UnknownCategory(value.to_string()))
        })
        .collect()
}

/// Resolve ids against stored categories, keeping the caller's order (first
/// id is the primary category) and dropping duplicates. Slugs always come
/// from the stored category.
pub async fn resolve_memberships(
    pool: &SqlitePool,
    ids: &[Uuid],
) -> Result<Vec<CategoryLink>, CatalogError> {
    let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    if unique.is_empty() {
        return Err(CatalogError::NoCategories);
    }

    let found = Category::find_many(pool, &unique).await?;
    if let Some(missing) = unique.iter().find(|id| !found.iter().any(|c| c.id == **id)) {
        return Err(CatalogError::UnknownCategory(missing.to_string()));
    }

    Ok(found
        .into_iter()
        .map(|category| CategoryLink {
            category_id: category.id,
            category_slug: category.slug,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use db::{
        models::category::CreateCategory,
        test_utils::create_test_pool,
    };

    use super::*;

    async fn create(pool: &SqlitePool, slug: &str) -> Category {
        Category::create(
            pool,
            &CreateCategory {
                name: slug.to_uppercase(),
                slug: slug.to_string(),
                description: None,
                sort_order: 0,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn resolves_in_order_without_duplicates() {
        let (pool, _dir) = create_test_pool().await;
        let a = create(&pool, "a").await;
        let b = create(&pool, "b").await;

        let links = resolve_memberships(&pool, &[b.id, a.id, b.id]).await.unwrap();
        let slugs: Vec<_> = links.iter().map(|l| l.category_slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn unknown_or_empty_is_rejected() {
        let (pool, _dir) = create_test_pool().await;
        let a = create(&pool, "a").await;

        assert!(matches!(
            resolve_memberships(&pool, &[]).await,
            Err(CatalogError::NoCategories)
        ));
        assert!(matches!(
            resolve_memberships(&pool, &[a.id, Uuid::new_v4()]).await,
            Err(CatalogError::UnknownCategory(_))
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        let id = Uuid::new_v4();
        assert_eq!(parse_category_ids(&[format!(" {id} ")]).unwrap(), vec![id]);
        assert!(matches!(
            parse_category_ids(&["interiors"]),
            Err(CatalogError::UnknownCategory(v)) if v == "interiors"
        ));
    }
}
