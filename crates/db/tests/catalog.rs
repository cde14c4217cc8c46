//! Integration tests for the category/image catalog and singleton documents.

use db::{
    DBService,
    models::{
        category::{Category, CategoryError, CreateCategory, UpdateCategory},
        contact::{ContactMessage, ContactStatus, CreateContactMessage},
        document::{Document, SITE_CONFIG},
        image::{CategoryLink, CreateImage, Image, UpdateImage},
        user::{CreateUser, User, UserError, UserRole},
    },
};
use serde_json::json;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let service = DBService::open(&temp_dir.path().join("catalog.sqlite"))
        .await
        .expect("Failed to open database");
    (service.pool, temp_dir)
}

async fn category(pool: &SqlitePool, name: &str, slug: &str, sort_order: i64) -> Category {
    Category::create(
        pool,
        &CreateCategory {
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            sort_order,
        },
    )
    .await
    .expect("Failed to create category")
}

fn new_image(title: &str, sort_order: i64, categories: &[&Category]) -> CreateImage {
    CreateImage {
        title: title.to_string(),
        description: None,
        location: Some("Lisbon".to_string()),
        url: format!("/uploads/{title}.jpg"),
        thumbnail_url: None,
        width: 1200,
        height: 800,
        sort_order,
        featured: false,
        categories: categories
            .iter()
            .map(|c| CategoryLink {
                category_id: c.id,
                category_slug: c.slug.clone(),
            })
            .collect(),
    }
}

#[tokio::test]
async fn duplicate_category_slug_is_a_conflict() {
    let (pool, _dir) = setup().await;
    category(&pool, "Interiors", "interiors", 0).await;

    let result = Category::create(
        &pool,
        &CreateCategory {
            name: "Interiors again".to_string(),
            slug: "interiors".to_string(),
            description: None,
            sort_order: 1,
        },
    )
    .await;

    assert!(matches!(result, Err(CategoryError::SlugTaken(slug)) if slug == "interiors"));
    assert_eq!(Category::count(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn slugs_must_be_url_safe() {
    let (pool, _dir) = setup().await;

    let result = Category::create(
        &pool,
        &CreateCategory {
            name: "Street".to_string(),
            slug: "Street Shots/2024".to_string(),
            description: None,
            sort_order: 0,
        },
    )
    .await;
    assert!(matches!(result, Err(CategoryError::InvalidSlug(_))));
    assert_eq!(Category::count(&pool).await.unwrap(), 0);

    let street = category(&pool, "Street", "street-shots-2024", 0).await;
    let result = Category::update(
        &pool,
        street.id,
        &UpdateCategory {
            slug: Some("street--shots".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(CategoryError::InvalidSlug(_))));
    let stored = Category::find_by_id(&pool, street.id).await.unwrap().unwrap();
    assert_eq!(stored.slug, "street-shots-2024");
}

#[tokio::test]
async fn categories_list_in_manual_order() {
    let (pool, _dir) = setup().await;
    category(&pool, "Second", "second", 2).await;
    category(&pool, "First", "first", 1).await;

    let slugs: Vec<_> = Category::find_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.slug)
        .collect();
    assert_eq!(slugs, vec!["first", "second"]);
}

#[tokio::test]
async fn category_update_merges_fields_and_renames_memberships() {
    let (pool, _dir) = setup().await;
    let interiors = category(&pool, "Interiors", "interiors", 0).await;
    let image = Image::create(&pool, &new_image("kitchen", 0, &[&interiors]))
        .await
        .unwrap();

    let updated = Category::update(
        &pool,
        interiors.id,
        &UpdateCategory {
            slug: Some("inside".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.name, "Interiors");
    assert_eq!(updated.slug, "inside");

    let image = Image::find_by_id(&pool, image.id).await.unwrap().unwrap();
    assert_eq!(image.category_slugs, vec!["inside"]);
    assert_eq!(Image::find_by_category(&pool, "inside").await.unwrap().len(), 1);
}

#[tokio::test]
async fn updating_missing_category_is_not_found() {
    let (pool, _dir) = setup().await;
    let result = Category::update(&pool, uuid::Uuid::new_v4(), &UpdateCategory::default()).await;
    assert!(matches!(result, Err(CategoryError::NotFound)));
}

#[tokio::test]
async fn deleting_a_category_leaves_images_alone() {
    let (pool, _dir) = setup().await;
    let interiors = category(&pool, "Interiors", "interiors", 0).await;
    let image = Image::create(&pool, &new_image("hall", 0, &[&interiors]))
        .await
        .unwrap();

    assert_eq!(Category::delete(&pool, interiors.id).await.unwrap(), 1);

    let image = Image::find_by_id(&pool, image.id).await.unwrap().unwrap();
    assert_eq!(image.category_ids, vec![interiors.id]);
}

#[tokio::test]
async fn images_keep_membership_order_and_filter_by_any_slug() {
    let (pool, _dir) = setup().await;
    let interiors = category(&pool, "Interiors", "interiors", 0).await;
    let exteriors = category(&pool, "Exteriors", "exteriors", 1).await;

    Image::create(&pool, &new_image("a", 1, &[&exteriors, &interiors]))
        .await
        .unwrap();
    Image::create(&pool, &new_image("b", 0, &[&interiors]))
        .await
        .unwrap();

    let all = Image::find_all(&pool).await.unwrap();
    assert_eq!(
        all.iter().map(|i| i.title.as_str()).collect::<Vec<_>>(),
        vec!["b", "a"]
    );
    assert_eq!(all[1].primary_category_slug(), Some("exteriors"));
    assert_eq!(all[1].category_slugs, vec!["exteriors", "interiors"]);

    assert_eq!(Image::find_by_category(&pool, "interiors").await.unwrap().len(), 2);
    assert_eq!(Image::find_by_category(&pool, "exteriors").await.unwrap().len(), 1);
    assert_eq!(Image::count_in_category(&pool, "interiors").await.unwrap(), 2);
    assert!(Image::find_by_category(&pool, "travel").await.unwrap().is_empty());
}

#[tokio::test]
async fn featured_lookup_applies_flag_and_limit() {
    let (pool, _dir) = setup().await;
    let interiors = category(&pool, "Interiors", "interiors", 0).await;

    for i in 0..4 {
        let mut data = new_image(&format!("img-{i}"), i, &[&interiors]);
        data.featured = i != 2;
        Image::create(&pool, &data).await.unwrap();
    }

    let featured = Image::find_featured(&pool, 2).await.unwrap();
    assert_eq!(
        featured.iter().map(|i| i.title.as_str()).collect::<Vec<_>>(),
        vec!["img-0", "img-1"]
    );
    assert_eq!(Image::find_featured(&pool, 12).await.unwrap().len(), 3);
    assert_eq!(Image::find_featured(&pool, 0).await.unwrap().len(), 3);
}

#[tokio::test]
async fn image_partial_update_order_and_featured_toggle() {
    let (pool, _dir) = setup().await;
    let interiors = category(&pool, "Interiors", "interiors", 0).await;
    let exteriors = category(&pool, "Exteriors", "exteriors", 1).await;
    let image = Image::create(&pool, &new_image("door", 0, &[&interiors]))
        .await
        .unwrap();

    let updated = Image::update(
        &pool,
        image.id,
        &UpdateImage {
            title: Some("Front door".to_string()),
            categories: Some(vec![CategoryLink {
                category_id: exteriors.id,
                category_slug: exteriors.slug.clone(),
            }]),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "Front door");
    assert_eq!(updated.location.as_deref(), Some("Lisbon"));
    assert_eq!(updated.category_slugs, vec!["exteriors"]);

    let reordered = Image::update_order(&pool, image.id, 7).await.unwrap();
    assert_eq!(reordered.sort_order, 7);

    let featured = Image::set_featured(&pool, image.id, true).await.unwrap();
    assert!(featured.featured);
}

#[tokio::test]
async fn deleting_an_image_drops_its_memberships() {
    let (pool, _dir) = setup().await;
    let interiors = category(&pool, "Interiors", "interiors", 0).await;
    let image = Image::create(&pool, &new_image("loft", 0, &[&interiors]))
        .await
        .unwrap();

    assert_eq!(Image::delete(&pool, image.id).await.unwrap(), 1);
    assert_eq!(Image::delete(&pool, image.id).await.unwrap(), 0);
    assert_eq!(Image::count_in_category(&pool, "interiors").await.unwrap(), 0);
}

#[tokio::test]
async fn contact_messages_list_newest_first_and_transition() {
    let (pool, _dir) = setup().await;
    let submit = |subject: &str| CreateContactMessage {
        name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        subject: subject.to_string(),
        message: "Hello".to_string(),
        project_type: None,
        budget: Some("2k".to_string()),
    };

    let first = ContactMessage::create(&pool, &submit("first")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    ContactMessage::create(&pool, &submit("second")).await.unwrap();

    assert_eq!(first.status, ContactStatus::New);
    let all = ContactMessage::find_all(&pool).await.unwrap();
    assert_eq!(all[0].subject, "second");

    let read = ContactMessage::update_status(&pool, first.id, ContactStatus::Read)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(read.status, ContactStatus::Read);

    assert_eq!(ContactMessage::delete(&pool, first.id).await.unwrap(), 1);
    assert!(ContactMessage::find_by_id(&pool, first.id).await.unwrap().is_none());
}

#[tokio::test]
async fn users_are_unique_by_normalized_email() {
    let (pool, _dir) = setup().await;
    let data = CreateUser {
        email: "Admin@Example.com".to_string(),
        password_hash: "$argon2id$v=19$placeholder".to_string(),
        name: "Admin".to_string(),
        role: UserRole::Admin,
    };

    let user = User::create(&pool, &data).await.unwrap();
    assert_eq!(user.email, "admin@example.com");
    assert!(User::find_by_email(&pool, "ADMIN@example.com").await.unwrap().is_some());
    assert!(matches!(
        User::create(&pool, &data).await,
        Err(UserError::EmailTaken(_))
    ));

    let serialized = serde_json::to_value(&user).unwrap();
    assert!(serialized.get("password_hash").is_none());
}

#[tokio::test]
async fn documents_insert_once_then_upsert() {
    let (pool, _dir) = setup().await;
    assert!(Document::get(&pool, SITE_CONFIG).await.unwrap().is_none());

    let first = Document::insert_if_absent(&pool, SITE_CONFIG, &json!({"a": 1}))
        .await
        .unwrap();
    let second = Document::insert_if_absent(&pool, SITE_CONFIG, &json!({"a": 2}))
        .await
        .unwrap();
    assert_eq!(first.body, json!({"a": 1}));
    assert_eq!(second.body, json!({"a": 1}));

    let updated = Document::upsert(&pool, SITE_CONFIG, &json!({"a": 3}))
        .await
        .unwrap();
    assert_eq!(updated.body, json!({"a": 3}));
}
