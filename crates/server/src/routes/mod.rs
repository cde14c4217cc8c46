use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{IntoMakeService, get},
};
use deployment::Deployment;
use services::services::storage::UPLOADS_URL_PREFIX;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::DeploymentImpl;

pub mod auth;
pub mod categories;
pub mod contact;
pub mod gallery;
pub mod health;
pub mod images;
pub mod profile;
pub mod site_config;
pub mod upload;

/// The full application: JSON API under `/api` and locally stored uploads
/// under `/uploads`.
pub fn app(deployment: DeploymentImpl) -> Router {
    let uploads_dir = deployment.config().storage.uploads_dir.clone();
    let cors = cors_layer(deployment.config().cors_origin.as_deref());

    let base_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(categories::router(&deployment))
        .merge(images::router(&deployment))
        .merge(gallery::router())
        .merge(upload::router(&deployment))
        .merge(site_config::router(&deployment))
        .merge(profile::router(&deployment))
        .merge(contact::router(&deployment))
        .merge(auth::router(&deployment))
        .with_state(deployment);

    let app = Router::new()
        .nest("/api", base_routes)
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(uploads_dir))
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

pub fn router(deployment: DeploymentImpl) -> IntoMakeService<Router> {
    app(deployment).into_make_service()
}

fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    match origin.parse::<HeaderValue>() {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        ),
        Err(e) => {
            tracing::warn!(origin, "Ignoring invalid PORTFOLIO_CORS_ORIGIN: {}", e);
            None
        }
    }
}
