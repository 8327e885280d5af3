use super::{subscribed_authors, UserResponse};
use crate::api::{ApiError, ErrorResponse};
use crate::auth::MaybeUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::User;
use crate::schema::users;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    viewer: MaybeUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;

    let user: User = users::table
        .find(id)
        .select(User::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let subscribed = subscribed_authors(&mut conn, viewer.id(), &[user.id])?;
    Ok(Json(UserResponse::new(
        &user,
        subscribed.contains(&user.id),
        &config,
    )))
}
