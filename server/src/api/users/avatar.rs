use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::images::{delete_image, image_url, store_data_url};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvatarRequest {
    /// Base64 data URL, e.g. `data:image/png;base64,...`
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar",
    tag = "users",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar replaced", body = AvatarResponse),
        (status = 400, description = "Invalid image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn set_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Json(req): Json<AvatarRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;

    let image_id = conn.transaction::<Uuid, ApiError, _>(|conn| {
        let image_id = store_data_url(conn, &req.avatar, "avatar")?;
        diesel::update(users::table.find(user.id))
            .set(users::avatar_id.eq(Some(image_id)))
            .execute(conn)?;
        Ok(image_id)
    })?;

    if let Some(old) = user.avatar_id {
        delete_image(&mut conn, old);
    }

    Ok(Json(AvatarResponse {
        avatar: image_url(&config, image_id),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar",
    tag = "users",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn delete_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> Result<StatusCode, ApiError> {
    let Some(old) = user.avatar_id else {
        return Ok(StatusCode::NO_CONTENT);
    };

    let mut conn = pool.get()?;
    diesel::update(users::table.find(user.id))
        .set(users::avatar_id.eq(None::<Uuid>))
        .execute(&mut conn)?;
    delete_image(&mut conn, old);

    Ok(StatusCode::NO_CONTENT)
}
