use chrono::{DateTime, Utc};
use db::models::document::{Document, DocumentError, PROFILE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;

use super::site_config::{SocialLinks, deep_merge, merged_view, set_sections};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("Invalid profile: {0}")]
    Invalid(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// The photographer shown on the about page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PhotographerProfile {
    pub name: String,
    pub bio: String,
    pub location: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub social_links: SocialLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PhotographerProfile {
    fn default() -> Self {
        let strings = |values: &[&str]| -> Vec<String> { values.iter().map(|s| s.to_string()).collect() };
        Self {
            name: "Professional Photographer".into(),
            bio: "NYC-based photographer specializing in architecture, interiors, and travel photography.".into(),
            location: "New York, NY".into(),
            email: "contact@photographer.com".into(),
            phone: None,
            skills: strings(&[
                "Architectural Photography",
                "Interior Design Photography",
                "Travel Photography",
                "Commercial Photography",
                "Photo Editing & Retouching",
                "Drone Photography",
            ]),
            interests: strings(&[
                "Urban Landscapes",
                "Modern Architecture",
                "Minimalist Design",
                "Cultural Documentation",
                "Light & Shadow",
            ]),
            avatar_url: None,
            social_links: SocialLinks {
                instagram: Some("https://instagram.com/photographer".into()),
                ..Default::default()
            },
            updated_at: None,
        }
    }
}

fn defaults() -> Result<Value, ProfileError> {
    serde_json::to_value(PhotographerProfile::default())
        .map_err(|e| ProfileError::Invalid(e.to_string()))
}

fn view(defaults: &Value, document: &Document) -> Result<PhotographerProfile, ProfileError> {
    let mut profile: PhotographerProfile =
        merged_view(defaults, document).map_err(|e| ProfileError::Invalid(e.to_string()))?;
    profile.updated_at = Some(document.updated_at);
    Ok(profile)
}

pub async fn get(pool: &SqlitePool) -> Result<PhotographerProfile, ProfileError> {
    let defaults = defaults()?;
    let document = Document::insert_if_absent(pool, PROFILE, &defaults).await?;
    view(&defaults, &document)
}

/// Top-level partial update; fields absent from `update` keep their value
pub async fn update(pool: &SqlitePool, update: Value) -> Result<PhotographerProfile, ProfileError> {
    let Value::Object(update) = update else {
        return Err(ProfileError::NotAnObject);
    };

    let defaults = defaults()?;
    let mut stored = match Document::get(pool, PROFILE).await? {
        Some(Document {
            body: Value::Object(body),
            ..
        }) => body,
        _ => match &defaults {
            Value::Object(defaults) => defaults.clone(),
            _ => Map::new(),
        },
    };
    set_sections(&mut stored, update);

    let candidate = Value::Object(stored);
    serde_json::from_value::<PhotographerProfile>(deep_merge(defaults.clone(), candidate.clone()))
        .map_err(|e| ProfileError::Invalid(e.to_string()))?;

    let document = Document::upsert(pool, PROFILE, &candidate).await?;
    tracing::info!("Profile updated");
    view(&defaults, &document)
}
