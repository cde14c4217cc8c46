use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::{category::CategoryError, document::DocumentError, user::UserError};
use deployment::DeploymentError;
use services::services::{
    auth::AuthError, catalog::CatalogError, contact::ContactError, profile::ProfileError,
    site_config::SiteConfigError, storage::StorageError, upload::UploadError,
};
use thiserror::Error;
use utils::response::ApiResponse;

const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred. Please try again later.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    SiteConfig(#[from] SiteConfigError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Contact(#[from] ContactError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Category(CategoryError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Category(CategoryError::SlugTaken(_)) => StatusCode::CONFLICT,
            ApiError::Category(CategoryError::InvalidSlug(_)) => StatusCode::BAD_REQUEST,
            ApiError::Category(CategoryError::Database(e)) | ApiError::Database(e) => {
                database_status(e)
            }
            ApiError::User(UserError::EmailTaken(_)) => StatusCode::CONFLICT,
            ApiError::User(UserError::Database(e)) => database_status(e),
            ApiError::Catalog(CatalogError::Database(e)) => database_status(e),
            ApiError::Catalog(_) => StatusCode::BAD_REQUEST,
            ApiError::Upload(UploadError::Catalog(CatalogError::Database(e)))
            | ApiError::Upload(UploadError::Database(e)) => database_status(e),
            ApiError::Upload(UploadError::Storage(_)) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::SiteConfig(SiteConfigError::Document(_))
            | ApiError::Profile(ProfileError::Document(_))
            | ApiError::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::SiteConfig(_) | ApiError::Profile(_) => StatusCode::BAD_REQUEST,
            ApiError::Contact(ContactError::Database(e)) => database_status(e),
            ApiError::Contact(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            ApiError::Auth(
                AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::TokenExpired,
            ) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(_) | ApiError::Deployment(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Multipart(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Message shown to the client. Server-side failures are replaced with a
    /// generic message after being logged.
    fn client_message(&self, status: StatusCode) -> String {
        if status.is_server_error() {
            return INTERNAL_ERROR_MESSAGE.to_string();
        }
        match self {
            ApiError::Database(_) | ApiError::Category(CategoryError::Database(_)) => {
                "Resource not found".to_string()
            }
            ApiError::NotFound(what) => format!("{what} not found"),
            ApiError::BadRequest(msg) | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Multipart(e) => format!("Invalid form data: {e}"),
            other => other.to_string(),
        }
    }
}

fn database_status(error: &sqlx::Error) -> StatusCode {
    match error {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, ?status, "Request failed");
        } else {
            tracing::debug!(error = %self, ?status, "Request rejected");
        }

        let message = self.client_message(status);
        let body = ApiResponse::<()>::error(&message);
        (status, Json(body)).into_response()
    }
}
