//! Upload pipeline: validate, name, store, record.

use std::{io::Cursor, path::Path};

use chrono::Utc;
use db::models::image::{CreateImage, DEFAULT_HEIGHT, DEFAULT_WIDTH, Image};
use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    catalog::{CatalogError, resolve_memberships},
    storage::{StorageChain, StorageError, StorageKind},
};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

const RANDOM_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    NoFile,
    #[error("Missing required fields: {0}")]
    MissingFields(String),
    #[error("Invalid file type. Only JPEG, PNG, and WebP images are allowed.")]
    InvalidType(String),
    #[error("File too large. Maximum size is 10MB.")]
    TooLarge(usize),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A parsed upload form
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: Option<UploadedFile>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub featured: bool,
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct UploadResponse {
    pub success: bool,
    pub image: Image,
    pub storage: StorageKind,
    pub message: String,
}

/// Reject disallowed types and oversized files
pub fn validate_file(content_type: &str, size: usize) -> Result<(), UploadError> {
    let content_type = content_type.trim().to_ascii_lowercase();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(UploadError::InvalidType(content_type));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge(size));
    }
    Ok(())
}

/// `"My Photo.jpg"` becomes `my-photo-{unix millis}-{6 base36 chars}.jpg`
pub fn unique_file_name(original: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    unique_file_name_with(original, Utc::now().timestamp_millis(), &suffix)
}

fn unique_file_name_with(original: &str, millis: i64, suffix: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    format!("{sanitized}-{millis}-{suffix}{ext}")
}

/// Pixel dimensions from the file header, or the default frame when the
/// header can't be read
pub fn image_dimensions(bytes: &[u8]) -> (i64, i64) {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_dimensions().ok())
        .map(|(w, h)| (i64::from(w), i64::from(h)))
        .unwrap_or((DEFAULT_WIDTH, DEFAULT_HEIGHT))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate, store and record an uploaded image.
///
/// Nothing reaches a storage backend until the form and the file have passed
/// validation and every category id has resolved.
pub async fn upload_image(
    pool: &SqlitePool,
    storage: &StorageChain,
    request: UploadRequest,
) -> Result<UploadResponse, UploadError> {
    let file = request.file.ok_or(UploadError::NoFile)?;

    let title = non_empty(request.title);
    let mut missing = Vec::new();
    if request.category_ids.is_empty() {
        missing.push("category_ids");
    }
    if title.is_none() {
        missing.push("title");
    }
    let Some(title) = title.filter(|_| missing.is_empty()) else {
        return Err(UploadError::MissingFields(missing.join(", ")));
    };

    validate_file(&file.content_type, file.bytes.len())?;

    let categories = resolve_memberships(pool, &request.category_ids).await?;
    let primary_slug = categories
        .first()
        .map(|c| c.category_slug.clone())
        .ok_or(CatalogError::NoCategories)?;

    let file_name = unique_file_name(&file.file_name);
    let stored = storage
        .put(&file.bytes, &file.content_type, &primary_slug, &file_name)
        .await?;

    let (width, height) = image_dimensions(&file.bytes);
    let sort_order = Image::count_in_category(pool, &primary_slug).await?;

    let image = Image::create(
        pool,
        &CreateImage {
            title,
            description: non_empty(request.description),
            location: non_empty(request.location),
            url: stored.url,
            thumbnail_url: None,
            width,
            height,
            sort_order,
            featured: request.featured,
            categories,
        },
    )
    .await?;

    tracing::info!(
        image_id = %image.id,
        storage = %stored.storage,
        category = %primary_slug,
        "Image uploaded"
    );

    Ok(UploadResponse {
        success: true,
        message: format!("Image uploaded successfully to {} storage", stored.storage),
        image,
        storage: stored.storage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_sanitized_and_suffixed() {
        assert_eq!(
            unique_file_name_with("My Photo.jpg", 1_700_000_000_000, "k3j9xq"),
            "my-photo-1700000000000-k3j9xq.jpg"
        );
        assert_eq!(
            unique_file_name_with("Été_2024 (1).PNG", 1, "aaaaaa"),
            "-t--2024--1--1-aaaaaa.PNG"
        );
        assert_eq!(unique_file_name_with("noext", 5, "abcdef"), "noext-5-abcdef");
    }

    #[test]
    fn names_generated_together_differ() {
        let a = unique_file_name("My Photo.jpg");
        let b = unique_file_name("My Photo.jpg");
        assert_ne!(a, b);
        assert!(a.starts_with("my-photo-"));
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn validation_enforces_type_and_size() {
        assert!(validate_file("image/jpeg", 10).is_ok());
        assert!(validate_file("image/webp", MAX_UPLOAD_BYTES).is_ok());
        assert!(matches!(
            validate_file("image/gif", 10),
            Err(UploadError::InvalidType(_))
        ));
        assert!(matches!(
            validate_file("image/png", MAX_UPLOAD_BYTES + 1),
            Err(UploadError::TooLarge(_))
        ));
    }

    #[test]
    fn unreadable_header_falls_back_to_default_frame() {
        assert_eq!(image_dimensions(b"not an image"), (1200, 800));
    }

    #[test]
    fn png_header_dimensions_are_read() {
        let mut bytes = Vec::new();
        image::RgbImage::new(7, 3)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(image_dimensions(&bytes), (7, 3));
    }
}
