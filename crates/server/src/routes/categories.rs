use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::category::{Category, CreateCategory, UpdateCategory};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::{load_category_middleware, require_admin},
};

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// GET /api/categories - List categories in manual order
pub async fn get_categories(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = Category::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(categories)))
}

/// GET /api/categories/{id}
pub async fn get_category(
    Extension(category): Extension<Category>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(category)))
}

/// GET /api/categories/slug/{slug}
pub async fn get_category_by_slug(
    State(deployment): State<DeploymentImpl>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    let category = Category::find_by_slug(&deployment.db().pool, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category".into()))?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

/// POST /api/categories - Create a category; the slug must be unused
#[tracing::instrument(skip_all, fields(slug = %payload.slug))]
pub async fn create_category(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    if blank(&payload.name) || blank(&payload.slug) {
        return Err(ApiError::BadRequest(
            "Category name and slug are required".into(),
        ));
    }
    let category = Category::create(&deployment.db().pool, &payload).await?;
    tracing::info!(category_id = %category.id, "Category created");
    Ok(ResponseJson(ApiResponse::success(category)))
}

/// PUT /api/categories/{id}
#[tracing::instrument(skip_all, fields(category_id = %category.id))]
pub async fn update_category(
    Extension(category): Extension<Category>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    if payload.name.as_deref().is_some_and(blank) || payload.slug.as_deref().is_some_and(blank) {
        return Err(ApiError::BadRequest(
            "Category name and slug cannot be empty".into(),
        ));
    }
    let updated = Category::update(&deployment.db().pool, category.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/categories/{id} - Images filed under it are left untouched
#[tracing::instrument(skip_all, fields(category_id = %category.id))]
pub async fn delete_category(
    Extension(category): Extension<Category>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Category::delete(&deployment.db().pool, category.id).await?;
    if rows_affected == 0 {
        Err(ApiError::Database(sqlx::Error::RowNotFound))
    } else {
        tracing::info!("Category deleted");
        Ok(ResponseJson(ApiResponse::success(())))
    }
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let category_router = Router::new()
        .route(
            "/",
            get(get_category).merge(
                put(update_category)
                    .delete(delete_category)
                    .route_layer(from_fn_with_state(deployment.clone(), require_admin)),
            ),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_category_middleware,
        ));

    let inner = Router::new()
        .route(
            "/",
            get(get_categories).merge(
                post(create_category)
                    .route_layer(from_fn_with_state(deployment.clone(), require_admin)),
            ),
        )
        .route("/slug/{slug}", get(get_category_by_slug))
        .nest("/{category_id}", category_router);

    Router::new().nest("/categories", inner)
}
