//! Create the default categories on an empty database.
//!
//! Usage:
//!   cargo run --bin seed_categories

use db::{
    DBService,
    models::category::{Category, CreateCategory},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn default_categories() -> Vec<CreateCategory> {
    vec![
        CreateCategory {
            name: "Interiors".to_string(),
            slug: "interiors".to_string(),
            description: Some("Interior photography and design".to_string()),
            sort_order: 0,
        },
        CreateCategory {
            name: "Exteriors".to_string(),
            slug: "exteriors".to_string(),
            description: Some("Exterior architecture and buildings".to_string()),
            sort_order: 1,
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Connecting to database...");
    let db = DBService::new().await?;
    let pool = &db.pool;

    let existing = Category::count(pool).await?;
    if existing > 0 {
        println!("{} categories already exist. Skipping creation.", existing);
        for category in Category::find_all(pool).await? {
            println!("  - {} ({})", category.name, category.slug);
        }
        return Ok(());
    }

    let categories = default_categories();
    for data in &categories {
        let category = Category::create(pool, data).await?;
        println!("Created category {} (slug: {})", category.name, category.slug);
    }
    println!();
    println!("Created {} categories.", categories.len());

    Ok(())
}
