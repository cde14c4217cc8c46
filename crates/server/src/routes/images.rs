use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::image::{
    CreateImage, DEFAULT_FEATURED_LIMIT, DEFAULT_HEIGHT, DEFAULT_WIDTH, Image, UpdateImage,
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::{catalog::resolve_memberships, gallery::selected_slug};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::{load_image_middleware, require_admin},
};

#[derive(Debug, Deserialize, TS)]
pub struct ImageQueryParams {
    /// Category slug; absent or `all` lists everything
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
pub struct FeaturedQueryParams {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Body of `POST /api/images` for records whose file is already hosted
#[derive(Debug, Deserialize, TS)]
pub struct CreateImageRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub url: String,
    #[serde(default, alias = "thumbnailUrl")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default, alias = "order")]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub featured: bool,
    /// First id is the primary category
    #[serde(default, alias = "categoryIds")]
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, TS)]
pub struct UpdateImageRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    #[serde(alias = "thumbnailUrl")]
    pub thumbnail_url: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    #[serde(alias = "order")]
    pub sort_order: Option<i64>,
    pub featured: Option<bool>,
    #[serde(alias = "categoryIds")]
    pub category_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateOrderRequest {
    pub order: i64,
}

#[derive(Debug, Deserialize, TS)]
pub struct SetFeaturedRequest {
    pub featured: bool,
}

/// GET /api/images[?category=slug]
pub async fn get_images(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<ImageQueryParams>,
) -> Result<ResponseJson<ApiResponse<Vec<Image>>>, ApiError> {
    let pool = &deployment.db().pool;
    let images = match selected_slug(params.category.as_deref()) {
        Some(slug) => Image::find_by_category(pool, slug).await?,
        None => Image::find_all(pool).await?,
    };
    Ok(ResponseJson(ApiResponse::success(images)))
}

/// GET /api/images/featured[?limit=N]
pub async fn get_featured_images(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<FeaturedQueryParams>,
) -> Result<ResponseJson<ApiResponse<Vec<Image>>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
    let images = Image::find_featured(&deployment.db().pool, limit).await?;
    Ok(ResponseJson(ApiResponse::success(images)))
}

/// GET /api/images/{id}
pub async fn get_image(
    Extension(image): Extension<Image>,
) -> Result<ResponseJson<ApiResponse<Image>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(image)))
}

/// POST /api/images
#[tracing::instrument(skip_all, fields(title = %payload.title))]
pub async fn create_image(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateImageRequest>,
) -> Result<ResponseJson<ApiResponse<Image>>, ApiError> {
    if payload.title.trim().is_empty() || payload.url.trim().is_empty() {
        return Err(ApiError::BadRequest("Image title and url are required".into()));
    }

    let pool = &deployment.db().pool;
    let categories = resolve_memberships(pool, &payload.category_ids).await?;

    let sort_order = match payload.sort_order {
        Some(order) => order,
        None => Image::count_in_category(pool, &categories[0].category_slug).await?,
    };

    let image = Image::create(
        pool,
        &CreateImage {
            title: payload.title.trim().to_string(),
            description: payload.description,
            location: payload.location,
            url: payload.url,
            thumbnail_url: payload.thumbnail_url,
            width: payload.width.unwrap_or(DEFAULT_WIDTH),
            height: payload.height.unwrap_or(DEFAULT_HEIGHT),
            sort_order,
            featured: payload.featured,
            categories,
        },
    )
    .await?;

    tracing::info!(image_id = %image.id, "Image created");
    Ok(ResponseJson(ApiResponse::success(image)))
}

/// PUT /api/images/{id} - Partial update; `category_ids` replaces all memberships
#[tracing::instrument(skip_all, fields(image_id = %image.id))]
pub async fn update_image(
    Extension(image): Extension<Image>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateImageRequest>,
) -> Result<ResponseJson<ApiResponse<Image>>, ApiError> {
    if payload.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("Image title cannot be empty".into()));
    }

    let pool = &deployment.db().pool;
    let categories = match &payload.category_ids {
        Some(ids) => Some(resolve_memberships(pool, ids).await?),
        None => None,
    };

    let data = UpdateImage {
        title: payload.title,
        description: payload.description,
        location: payload.location,
        url: payload.url,
        thumbnail_url: payload.thumbnail_url,
        width: payload.width,
        height: payload.height,
        sort_order: payload.sort_order,
        featured: payload.featured,
        categories,
    };
    let updated = Image::update(pool, image.id, &data).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// PUT /api/images/{id}/order
pub async fn update_image_order(
    Extension(image): Extension<Image>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<ResponseJson<ApiResponse<Image>>, ApiError> {
    let updated = Image::update_order(&deployment.db().pool, image.id, payload.order).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// PUT /api/images/{id}/featured
pub async fn set_image_featured(
    Extension(image): Extension<Image>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<SetFeaturedRequest>,
) -> Result<ResponseJson<ApiResponse<Image>>, ApiError> {
    let updated = Image::set_featured(&deployment.db().pool, image.id, payload.featured).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/images/{id}
#[tracing::instrument(skip_all, fields(image_id = %image.id))]
pub async fn delete_image(
    Extension(image): Extension<Image>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Image::delete(&deployment.db().pool, image.id).await?;
    if rows_affected == 0 {
        Err(ApiError::Database(sqlx::Error::RowNotFound))
    } else {
        tracing::info!("Image deleted");
        Ok(ResponseJson(ApiResponse::success(())))
    }
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let admin = || from_fn_with_state(deployment.clone(), require_admin);

    let image_router = Router::new()
        .route(
            "/",
            get(get_image).merge(
                put(update_image)
                    .delete(delete_image)
                    .route_layer(admin()),
            ),
        )
        .route("/order", put(update_image_order).route_layer(admin()))
        .route("/featured", put(set_image_featured).route_layer(admin()))
        .layer(from_fn_with_state(deployment.clone(), load_image_middleware));

    let inner = Router::new()
        .route(
            "/",
            get(get_images).merge(post(create_image).route_layer(admin())),
        )
        .route("/featured", get(get_featured_images))
        .nest("/{image_id}", image_router);

    Router::new().nest("/images", inner)
}
