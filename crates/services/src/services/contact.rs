use db::models::contact::{ContactMessage, CreateContactMessage};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex");
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Name, email, subject, and message are required")]
    MissingFields,
    #[error("Please provide a valid email address")]
    InvalidEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Public contact form body
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "project_type")]
    pub project_type: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn required(value: Option<String>) -> Result<String, ContactError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ContactError::MissingFields)
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ContactSubmission {
    pub fn validate(self) -> Result<CreateContactMessage, ContactError> {
        let name = required(self.name)?;
        let email = required(self.email)?;
        let subject = required(self.subject)?;
        let message = required(self.message)?;

        if !is_valid_email(&email) {
            return Err(ContactError::InvalidEmail);
        }

        Ok(CreateContactMessage {
            name,
            email,
            subject,
            message,
            project_type: optional(self.project_type),
            budget: optional(self.budget),
        })
    }
}

/// Validate and store a public submission
pub async fn submit(
    pool: &SqlitePool,
    submission: ContactSubmission,
) -> Result<ContactMessage, ContactError> {
    let data = submission.validate()?;
    let message = ContactMessage::create(pool, &data).await?;
    tracing::info!(contact_id = %message.id, "Contact message received");
    Ok(message)
}
