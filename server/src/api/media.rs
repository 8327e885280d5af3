use crate::api::{ApiError, ErrorResponse};
use crate::db::DbPool;
use crate::schema::images;
use crate::AppState;
use axum::routing::get;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Router,
};
use diesel::prelude::*;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

/// Returns the router for stored images (mounted at /media)
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_image))
}

#[utoipa::path(
    get,
    path = "/media/{id}",
    tag = "media",
    params(
        ("id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn get_image(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;

    let (content_type, data): (String, Vec<u8>) = images::table
        .find(id)
        .select((images::content_type, images::data))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Image"))?;

    // Images are immutable; replacing one creates a new id.
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        data,
    ))
}

#[derive(OpenApi)]
#[openapi(paths(get_image))]
pub struct ApiDoc;
