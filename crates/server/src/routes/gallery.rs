use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{category::Category, image::Image};
use deployment::Deployment;
use services::services::gallery::GalleryView;
use utils::response::ApiResponse;

use super::images::ImageQueryParams;
use crate::{DeploymentImpl, error::ApiError};

/// GET /api/gallery[?category=slug] - Categories plus the filtered image list
pub async fn get_gallery(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<ImageQueryParams>,
) -> Result<ResponseJson<ApiResponse<GalleryView>>, ApiError> {
    let pool = &deployment.db().pool;
    let (categories, images) = tokio::try_join!(Category::find_all(pool), Image::find_all(pool))?;
    let view = GalleryView::new(categories, images, params.category.as_deref());
    Ok(ResponseJson(ApiResponse::success(view)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/gallery", get(get_gallery))
}
