//! Editable site copy, theme tokens and analytics ids.
//!
//! One document is stored. Reads overlay it on [`SiteConfig::default`] so
//! sections added after the document was written still come back complete.

use chrono::{DateTime, Utc};
use db::models::document::{Document, DocumentError, SITE_CONFIG};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;

/// Keys a client may send back that are never stored
const IGNORED_KEYS: &[&str] = &["_id", "id", "updatedAt", "updated_at"];

#[derive(Debug, Error)]
pub enum SiteConfigError {
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SeoConfig {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsConfig {
    /// GA4 measurement id (`G-XXXXXXXXXX`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_analytics_id: Option<String>,
    /// GTM container id (`GTM-XXXXXXX`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_tag_manager_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HeroConfig {
    pub enabled: bool,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub primary_button_text: String,
    pub primary_button_link: String,
    pub secondary_button_text: String,
    pub secondary_button_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct StatsConfig {
    pub projects: String,
    pub projects_label: String,
    pub years: String,
    pub years_label: String,
    pub location: String,
    pub location_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AboutConfig {
    pub title: String,
    pub subtitle: String,
    pub bio: String,
    pub skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ContactConfig {
    pub email: String,
    pub phone: String,
    pub address: String,
    pub social_links: SocialLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct FooterConfig {
    pub copyright_text: String,
    pub tagline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct FontConfig {
    /// Google Font family names
    pub heading_font: String,
    pub body_font: String,
    pub logo_font: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ColorScheme {
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    pub fonts: FontConfig,
    pub light_mode: ColorScheme,
    pub dark_mode: ColorScheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub seo: SeoConfig,
    pub analytics: AnalyticsConfig,
    pub hero: HeroConfig,
    pub stats: StatsConfig,
    pub about: AboutConfig,
    pub contact: ContactConfig,
    pub footer: FooterConfig,
    pub theme: ThemeConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            seo: SeoConfig {
                title: "NYC Professional Photographer | Architecture, Interiors & Travel Photography"
                    .into(),
                description: "Award-winning NYC-based photographer specializing in architectural photography, interior design, and travel documentation. Available for commercial and editorial projects.".into(),
                keywords: strings(&[
                    "photographer",
                    "NYC photographer",
                    "architecture photography",
                    "interior photography",
                    "travel photography",
                    "commercial photographer",
                    "New York",
                ]),
                favicon: None,
            },
            analytics: AnalyticsConfig::default(),
            hero: HeroConfig {
                enabled: true,
                title: "Visual Stories".into(),
                subtitle: "Through the Lens".into(),
                description: "NYC-based photographer specializing in architecture, interiors, and travel photography. Capturing moments that matter.".into(),
                primary_button_text: "View Portfolio".into(),
                primary_button_link: "/gallery".into(),
                secondary_button_text: "Get in Touch".into(),
                secondary_button_link: "/contact".into(),
            },
            stats: StatsConfig {
                projects: "500+".into(),
                projects_label: "Projects".into(),
                years: "10+".into(),
                years_label: "Years".into(),
                location: "NYC".into(),
                location_label: "Based".into(),
            },
            about: AboutConfig {
                title: "About Me".into(),
                subtitle: "Professional Photographer".into(),
                bio: "I am a professional photographer based in New York City, specializing in architecture, interior design, and travel photography. With over a decade of experience, I bring a unique perspective to every project.".into(),
                skills: strings(&[
                    "Architecture Photography",
                    "Interior Design",
                    "Travel Photography",
                    "Commercial Projects",
                    "Editorial Work",
                ]),
                interests: strings(&[
                    "Urban Exploration",
                    "Minimalist Design",
                    "Street Photography",
                    "Documentary Work",
                    "Fine Art",
                ]),
            },
            contact: ContactConfig {
                email: "hello@photographer.com".into(),
                phone: "+1 (555) 123-4567".into(),
                address: "New York, NY".into(),
                social_links: SocialLinks {
                    instagram: Some("https://instagram.com/photographer".into()),
                    twitter: Some("https://twitter.com/photographer".into()),
                    linkedin: Some("https://linkedin.com/in/photographer".into()),
                    facebook: None,
                },
            },
            footer: FooterConfig {
                copyright_text: "© 2024 Professional Photographer. All rights reserved.".into(),
                tagline: "Capturing moments that matter".into(),
            },
            theme: ThemeConfig {
                fonts: FontConfig {
                    heading_font: "Playfair Display".into(),
                    body_font: "Inter".into(),
                    logo_font: "Playfair Display".into(),
                },
                light_mode: ColorScheme {
                    primary_color: "#111827".into(),
                    background_color: "#ffffff".into(),
                    text_color: "#111827".into(),
                    accent_color: "#6b7280".into(),
                },
                dark_mode: ColorScheme {
                    primary_color: "#ffffff".into(),
                    background_color: "#111827".into(),
                    text_color: "#f9fafb".into(),
                    accent_color: "#9ca3af".into(),
                },
            },
            updated_at: None,
        }
    }
}

/// Overlay `overlay` on `base`.
///
/// Objects merge key by key, recursively. Any other overlay value replaces the
/// base value, except `null`, which keeps it.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if value.is_null() {
                    continue;
                }
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Replace the top-level sections present in `update`, skipping ids and
/// timestamps
pub fn set_sections(stored: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, value) in update {
        if IGNORED_KEYS.contains(&key.as_str()) {
            continue;
        }
        stored.insert(key, value);
    }
}

/// Merge a stored singleton over its defaults and decode it
pub(crate) fn merged_view<T>(defaults: &Value, document: &Document) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    serde_json::from_value(deep_merge(defaults.clone(), document.body.clone()))
}

fn defaults() -> Result<Value, SiteConfigError> {
    serde_json::to_value(SiteConfig::default()).map_err(|e| SiteConfigError::Invalid(e.to_string()))
}

fn view(defaults: &Value, document: &Document) -> Result<SiteConfig, SiteConfigError> {
    let mut config: SiteConfig =
        merged_view(defaults, document).map_err(|e| SiteConfigError::Invalid(e.to_string()))?;
    config.updated_at = Some(document.updated_at);
    Ok(config)
}

/// Current configuration; the defaults are stored first if nothing is
pub async fn get(pool: &SqlitePool) -> Result<SiteConfig, SiteConfigError> {
    let defaults = defaults()?;
    let document = Document::insert_if_absent(pool, SITE_CONFIG, &defaults).await?;
    view(&defaults, &document)
}

/// Replace the sections present in `update` and return the merged result.
///
/// The update is rejected without writing when the merged document would not
/// decode as a [`SiteConfig`].
pub async fn update(pool: &SqlitePool, update: Value) -> Result<SiteConfig, SiteConfigError> {
    let Value::Object(update) = update else {
        return Err(SiteConfigError::NotAnObject);
    };

    let defaults = defaults()?;
    let mut stored = match Document::get(pool, SITE_CONFIG).await? {
        Some(Document {
            body: Value::Object(body),
            ..
        }) => body,
        _ => Map::new(),
    };
    set_sections(&mut stored, update);

    let candidate = Value::Object(stored);
    serde_json::from_value::<SiteConfig>(deep_merge(defaults.clone(), candidate.clone()))
        .map_err(|e| SiteConfigError::Invalid(e.to_string()))?;

    let document = Document::upsert(pool, SITE_CONFIG, &candidate).await?;
    tracing::info!("Site configuration updated");
    view(&defaults, &document)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn objects_merge_recursively() {
        let merged = deep_merge(
            json!({"theme": {"fonts": {"bodyFont": "Inter", "headingFont": "Playfair"}}}),
            json!({"theme": {"fonts": {"bodyFont": "Lato"}}}),
        );
        assert_eq!(
            merged,
            json!({"theme": {"fonts": {"bodyFont": "Lato", "headingFont": "Playfair"}}})
        );
    }

    #[test]
    fn arrays_and_scalars_replace_and_null_keeps_default() {
        let merged = deep_merge(
            json!({"keywords": ["a", "b"], "enabled": true, "title": "x"}),
            json!({"keywords": ["c"], "enabled": false, "title": null, "extra": 1}),
        );
        assert_eq!(
            merged,
            json!({"keywords": ["c"], "enabled": false, "title": "x", "extra": 1})
        );
    }

    #[test]
    fn set_sections_skips_ids_and_timestamps() {
        let mut stored = Map::new();
        stored.insert("hero".into(), json!({"title": "old"}));
        let Value::Object(update) = json!({
            "_id": "abc",
            "id": "def",
            "updatedAt": "2020-01-01",
            "hero": {"title": "new"}
        }) else {
            unreachable!()
        };
        set_sections(&mut stored, update);
        assert_eq!(Value::Object(stored), json!({"hero": {"title": "new"}}));
    }

    #[test]
    fn defaults_serialize_camel_case() {
        let value = serde_json::to_value(SiteConfig::default()).unwrap();
        assert_eq!(value["hero"]["primaryButtonLink"], "/gallery");
        assert_eq!(value["theme"]["lightMode"]["backgroundColor"], "#ffffff");
        assert!(value.get("updatedAt").is_none());
    }
}
