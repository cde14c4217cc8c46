//! Import categories and images from a legacy JSON export.
//!
//! The export is a single object `{"categories": [...], "images": [...]}`.
//! Image documents may describe their categories with either the singular
//! (`categoryId`/`categorySlug`) or the plural (`categoryIds`/`categorySlugs`)
//! fields. Rows that already exist (same category slug, same image URL) are
//! skipped, never overwritten.
//!
//! Usage:
//!   cargo run --bin import_legacy -- export.json                 # Dry-run (default)
//!   cargo run --bin import_legacy -- export.json --execute       # Write to the database
//!   cargo run --bin import_legacy -- export.json --assign-by-keyword
//!       Uncategorized images are filed by keywords in their title,
//!       description and location, falling back to the first category.

use std::{
    collections::{HashMap, HashSet},
    env,
    path::PathBuf,
};

use anyhow::{Context, bail};
use db::{
    DBService,
    models::{
        category::{Category, CreateCategory, is_valid_slug},
        image::{CategoryLink, CategoryMembership, CreateImage, DEFAULT_HEIGHT, DEFAULT_WIDTH, Image},
    },
};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const INTERIOR_KEYWORDS: &[&str] = &[
    "kitchen", "room", "interior", "hallway", "loft", "bedroom", "bathroom", "living", "dining",
];
const EXTERIOR_KEYWORDS: &[&str] = &[
    "exterior", "facade", "building", "arch", "door", "entrance", "outside",
];

/// Document ids appear either as plain strings or as `{"$oid": "..."}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LegacyId {
    Plain(String),
    Object {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl LegacyId {
    fn as_str(&self) -> &str {
        match self {
            LegacyId::Plain(id) => id,
            LegacyId::Object { oid } => oid,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCategory {
    #[serde(default, rename = "_id", alias = "id")]
    id: Option<LegacyId>,
    name: String,
    slug: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    order: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyImage {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    firebase_url: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    width: Option<i64>,
    #[serde(default)]
    height: Option<i64>,
    #[serde(default)]
    order: Option<i64>,
    #[serde(default)]
    featured: Option<bool>,
    #[serde(flatten)]
    membership: Option<CategoryMembership>,
}

impl LegacyImage {
    fn source_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.firebase_url.as_deref())
            .filter(|u| !u.trim().is_empty())
    }

    fn search_text(&self) -> String {
        [&self.title, &self.description, &self.location]
            .iter()
            .filter_map(|field| field.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

#[derive(Debug, Default, Deserialize)]
struct LegacyExport {
    #[serde(default)]
    categories: Vec<LegacyCategory>,
    #[serde(default)]
    images: Vec<LegacyImage>,
}

/// Known categories, addressable by slug or by their legacy document id
#[derive(Debug, Default)]
struct CategoryLookup {
    /// Slugs in manual order; the first is the fallback category
    ordered: Vec<String>,
    by_slug: HashMap<String, Uuid>,
    by_legacy_id: HashMap<String, String>,
}

impl CategoryLookup {
    fn insert(&mut self, slug: &str, id: Uuid, legacy_id: Option<&str>) {
        if !self.by_slug.contains_key(slug) {
            self.ordered.push(slug.to_string());
        }
        self.by_slug.insert(slug.to_string(), id);
        if let Some(legacy_id) = legacy_id {
            self.by_legacy_id
                .insert(legacy_id.to_string(), slug.to_string());
        }
    }

    fn link(&self, slug: &str) -> Option<CategoryLink> {
        self.by_slug.get(slug).map(|id| CategoryLink {
            category_id: *id,
            category_slug: slug.to_string(),
        })
    }

    /// Resolve a stored membership. The slug wins; a stale slug is recovered
    /// through the legacy id when possible.
    fn resolve(&self, membership: &CategoryMembership) -> Vec<CategoryLink> {
        let mut links: Vec<CategoryLink> = Vec::new();
        for entry in membership.links() {
            let link = self.link(entry.slug).or_else(|| {
                entry
                    .id
                    .and_then(|id| self.by_legacy_id.get(id))
                    .and_then(|slug| self.link(slug))
            });
            if let Some(link) = link
                && !links.iter().any(|l| l.category_id == link.category_id)
            {
                links.push(link);
            }
        }
        links
    }
}

/// Category slug suggested by the words in an image's text
fn keyword_category(text: &str) -> Option<&'static str> {
    if INTERIOR_KEYWORDS.iter().any(|k| text.contains(k)) {
        Some("interiors")
    } else if EXTERIOR_KEYWORDS.iter().any(|k| text.contains(k)) {
        Some("exteriors")
    } else {
        None
    }
}

/// Memberships for one image: stored links when they resolve, otherwise the
/// keyword guess (when enabled), otherwise the first category.
fn assign_categories(
    image: &LegacyImage,
    lookup: &CategoryLookup,
    assign_by_keyword: bool,
) -> Vec<CategoryLink> {
    let stored = image
        .membership
        .as_ref()
        .map(|m| lookup.resolve(m))
        .unwrap_or_default();
    if !stored.is_empty() || !assign_by_keyword {
        return stored;
    }

    keyword_category(&image.search_text())
        .and_then(|slug| lookup.link(slug))
        .or_else(|| lookup.ordered.first().and_then(|slug| lookup.link(slug)))
        .into_iter()
        .collect()
}

fn print_usage() {
    println!("Legacy Import");
    println!();
    println!("Usage:");
    println!("  cargo run --bin import_legacy -- <export.json>                     Dry-run (default)");
    println!("  cargo run --bin import_legacy -- <export.json> --execute           Write to the database");
    println!("  cargo run --bin import_legacy -- <export.json> --assign-by-keyword File uncategorized images by keyword");
}

#[derive(Debug, Default)]
struct ImportResult {
    categories_created: usize,
    categories_skipped: usize,
    images_created: usize,
    images_skipped: usize,
    images_uncategorized: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let execute = args.iter().any(|a| a == "--execute");
    let assign_by_keyword = args.iter().any(|a| a == "--assign-by-keyword");
    let Some(path) = args.iter().find(|a| !a.starts_with("--")).map(PathBuf::from) else {
        bail!("missing path to the export file");
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let export: LegacyExport =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a valid export", path.display()))?;

    println!("=== Legacy Import ===");
    println!();
    if !execute {
        println!("Running in DRY-RUN mode. No changes will be made.");
        println!("Use --execute to write to the database.");
        println!();
    }

    info!("Connecting to database...");
    let db = DBService::new().await?;
    let pool = &db.pool;

    let mut result = ImportResult::default();
    let mut lookup = CategoryLookup::default();
    for category in Category::find_all(pool).await? {
        lookup.insert(&category.slug, category.id, None);
    }

    for (index, legacy) in export.categories.iter().enumerate() {
        let legacy_id = legacy.id.as_ref().map(LegacyId::as_str);
        if let Some(existing) = lookup.by_slug.get(&legacy.slug).copied() {
            println!("Skipped category \"{}\" (slug already exists)", legacy.slug);
            lookup.insert(&legacy.slug, existing, legacy_id);
            result.categories_skipped += 1;
            continue;
        }
        if !is_valid_slug(&legacy.slug) {
            println!("Skipped category \"{}\" (slug is not URL-safe)", legacy.slug);
            result.categories_skipped += 1;
            continue;
        }

        let id = if execute {
            let created = Category::create(
                pool,
                &CreateCategory {
                    name: legacy.name.clone(),
                    slug: legacy.slug.clone(),
                    description: legacy.description.clone(),
                    sort_order: legacy.order.unwrap_or(index as i64),
                },
            )
            .await?;
            created.id
        } else {
            Uuid::new_v4()
        };
        println!("Created category \"{}\" ({})", legacy.name, legacy.slug);
        lookup.insert(&legacy.slug, id, legacy_id);
        result.categories_created += 1;
    }

    let mut known_urls: HashSet<String> = Image::find_all(pool)
        .await?
        .into_iter()
        .map(|image| image.url)
        .collect();
    let mut planned_counts: HashMap<String, i64> = HashMap::new();

    for legacy in &export.images {
        let title = legacy.title.clone().unwrap_or_default();
        let Some(url) = legacy.source_url() else {
            warn!(title = %title, "Image has no URL, skipping");
            result.images_skipped += 1;
            continue;
        };
        if !known_urls.insert(url.to_string()) {
            println!("Skipped \"{}\" (already imported)", title);
            result.images_skipped += 1;
            continue;
        }

        let categories = assign_categories(legacy, &lookup, assign_by_keyword);
        let Some(primary) = categories.first() else {
            warn!(title = %title, "No resolvable category, skipping (try --assign-by-keyword)");
            result.images_uncategorized += 1;
            continue;
        };

        let sort_order = match legacy.order {
            Some(order) => order,
            None => {
                let planned = planned_counts
                    .entry(primary.category_slug.clone())
                    .or_insert(0);
                let existing = if execute {
                    Image::count_in_category(pool, &primary.category_slug).await?
                } else {
                    *planned
                };
                *planned += 1;
                existing
            }
        };

        println!("Imported \"{}\" -> {}", title, primary.category_slug);
        if execute {
            Image::create(
                pool,
                &CreateImage {
                    title,
                    description: legacy.description.clone(),
                    location: legacy.location.clone(),
                    url: url.to_string(),
                    thumbnail_url: legacy.thumbnail_url.clone(),
                    width: legacy.width.unwrap_or(DEFAULT_WIDTH),
                    height: legacy.height.unwrap_or(DEFAULT_HEIGHT),
                    sort_order,
                    featured: legacy.featured.unwrap_or(false),
                    categories,
                },
            )
            .await?;
        }
        result.images_created += 1;
    }

    println!();
    println!("=== Import Complete ===");
    println!("Categories created: {}", result.categories_created);
    println!("Categories skipped: {}", result.categories_skipped);
    println!("Images imported:    {}", result.images_created);
    println!("Images skipped:     {}", result.images_skipped);
    println!("Images without a category: {}", result.images_uncategorized);

    if !execute {
        println!();
        println!("Dry-run complete. Run with --execute to import.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> CategoryLookup {
        let mut lookup = CategoryLookup::default();
        lookup.insert("interiors", Uuid::new_v4(), Some("64a0"));
        lookup.insert("exteriors", Uuid::new_v4(), Some("64a1"));
        lookup
    }

    fn image(json: &str) -> LegacyImage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn singular_and_plural_documents_resolve_the_same_way() {
        let lookup = lookup();
        let single = image(r#"{"title":"A","url":"u1","categoryId":"64a0","categorySlug":"interiors"}"#);
        let plural = image(
            r#"{"title":"B","url":"u2","categoryIds":["64a0","64a1"],"categorySlugs":["interiors","exteriors"]}"#,
        );

        let single_links = assign_categories(&single, &lookup, false);
        assert_eq!(single_links.len(), 1);
        assert_eq!(single_links[0].category_slug, "interiors");

        let plural_links = assign_categories(&plural, &lookup, false);
        let slugs: Vec<_> = plural_links.iter().map(|l| l.category_slug.as_str()).collect();
        assert_eq!(slugs, vec!["interiors", "exteriors"]);
    }

    #[test]
    fn stale_slug_is_recovered_through_legacy_id() {
        let doc = image(r#"{"url":"u","categoryId":"64a1","categorySlug":"outdoors"}"#);
        let links = assign_categories(&doc, &lookup(), false);
        assert_eq!(links[0].category_slug, "exteriors");
    }

    #[test]
    fn keyword_assignment_only_for_uncategorized_images() {
        let lookup = lookup();
        let doc = image(r#"{"title":"Grand Facade","location":"Paris","url":"u"}"#);
        assert!(doc.membership.is_none());
        assert!(assign_categories(&doc, &lookup, false).is_empty());
        assert_eq!(
            assign_categories(&doc, &lookup, true)[0].category_slug,
            "exteriors"
        );

        let unmatched = image(r#"{"title":"Portrait","url":"u"}"#);
        assert_eq!(
            assign_categories(&unmatched, &lookup, true)[0].category_slug,
            "interiors"
        );
    }

    #[test]
    fn interior_keywords_take_precedence() {
        assert_eq!(keyword_category("loft with arched door"), Some("interiors"));
        assert_eq!(keyword_category("stone arch"), Some("exteriors"));
        assert_eq!(keyword_category("portrait"), None);
    }

    #[test]
    fn ids_and_urls_accept_both_export_styles() {
        let category: LegacyCategory = serde_json::from_str(
            r#"{"_id":{"$oid":"64a0"},"name":"Interiors","slug":"interiors","order":0}"#,
        )
        .unwrap();
        assert_eq!(category.id.unwrap().as_str(), "64a0");

        let doc = image(r#"{"firebaseUrl":"https://example.com/a.jpg"}"#);
        assert_eq!(doc.source_url(), Some("https://example.com/a.jpg"));
    }
}
