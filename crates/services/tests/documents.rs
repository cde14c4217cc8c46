use db::{
    models::document::{Document, PROFILE, SITE_CONFIG},
    test_utils::create_test_pool,
};
use serde_json::json;
use services::services::{
    profile,
    site_config::{self, SiteConfig, SiteConfigError},
};

#[tokio::test]
async fn first_read_stores_defaults() {
    let (pool, _dir) = create_test_pool().await;

    let config = site_config::get(&pool).await.unwrap();
    assert_eq!(config.hero.title, "Visual Stories");
    assert!(config.updated_at.is_some());
    assert!(Document::get(&pool, SITE_CONFIG).await.unwrap().is_some());
}

#[tokio::test]
async fn stored_sections_are_merged_over_defaults() {
    let (pool, _dir) = create_test_pool().await;
    // A document written before the theme and analytics sections existed
    Document::upsert(
        &pool,
        SITE_CONFIG,
        &json!({
            "hero": {"title": "Light Work", "enabled": false},
            "seo": {"keywords": ["only"]},
            "footer": {"tagline": null}
        }),
    )
    .await
    .unwrap();

    let config = site_config::get(&pool).await.unwrap();
    let defaults = SiteConfig::default();
    assert_eq!(config.hero.title, "Light Work");
    assert!(!config.hero.enabled);
    assert_eq!(config.hero.subtitle, defaults.hero.subtitle);
    assert_eq!(config.seo.keywords, vec!["only"]);
    assert_eq!(config.seo.title, defaults.seo.title);
    assert_eq!(config.footer.tagline, defaults.footer.tagline);
    assert_eq!(config.theme, defaults.theme);
}

#[tokio::test]
async fn update_replaces_whole_sections_and_ignores_ids() {
    let (pool, _dir) = create_test_pool().await;
    site_config::get(&pool).await.unwrap();

    let updated = site_config::update(
        &pool,
        json!({
            "_id": "507f1f77bcf86cd799439011",
            "updatedAt": "2001-01-01T00:00:00Z",
            "theme": {"fonts": {"headingFont": "Lora"}},
            "analytics": {"googleAnalyticsId": "G-TEST"}
        }),
    )
    .await
    .unwrap();

    assert_eq!(updated.theme.fonts.heading_font, "Lora");
    // The stored theme section was replaced; missing keys come from defaults
    assert_eq!(updated.theme.fonts.body_font, "Inter");
    assert_eq!(
        updated.analytics.google_analytics_id.as_deref(),
        Some("G-TEST")
    );

    let stored = Document::get(&pool, SITE_CONFIG).await.unwrap().unwrap();
    assert!(stored.body.get("_id").is_none());
    assert!(stored.body.get("updatedAt").is_none());
    assert_eq!(stored.body["theme"], json!({"fonts": {"headingFont": "Lora"}}));
}

#[tokio::test]
async fn update_upserts_when_nothing_is_stored() {
    let (pool, _dir) = create_test_pool().await;
    let updated = site_config::update(&pool, json!({"stats": {"projects": "12"}}))
        .await
        .unwrap();
    assert_eq!(updated.stats.projects, "12");
    assert_eq!(updated.stats.years, "10+");
}

#[tokio::test]
async fn invalid_updates_are_rejected_without_writing() {
    let (pool, _dir) = create_test_pool().await;

    assert!(matches!(
        site_config::update(&pool, json!(["not", "an", "object"])).await,
        Err(SiteConfigError::NotAnObject)
    ));
    assert!(matches!(
        site_config::update(&pool, json!({"hero": {"enabled": "yes"}})).await,
        Err(SiteConfigError::Invalid(_))
    ));
    assert!(Document::get(&pool, SITE_CONFIG).await.unwrap().is_none());
}

#[tokio::test]
async fn profile_defaults_then_partial_update() {
    let (pool, _dir) = create_test_pool().await;

    let profile = profile::get(&pool).await.unwrap();
    assert_eq!(profile.name, "Professional Photographer");
    assert_eq!(profile.skills.len(), 6);

    let updated = profile::update(
        &pool,
        json!({"bio": "Shooting buildings since 2010", "phone": "+1 555 0100", "id": "x"}),
    )
    .await
    .unwrap();
    assert_eq!(updated.bio, "Shooting buildings since 2010");
    assert_eq!(updated.phone.as_deref(), Some("+1 555 0100"));
    assert_eq!(updated.location, "New York, NY");

    let stored = Document::get(&pool, PROFILE).await.unwrap().unwrap();
    assert!(stored.body.get("id").is_none());
}
