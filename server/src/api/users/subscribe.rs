use super::subscriptions::SubscriptionsQuery;
use super::{with_recipes, UserWithRecipes};
use crate::api::error::is_unique_violation;
use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::{NewSubscription, User};
use crate::schema::{subscriptions, users};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = i64, Path, description = "Author ID"),
        ("recipes_limit" = Option<i64>, Query, description = "Recipes shown in the response")
    ),
    responses(
        (status = 201, description = "Subscribed", body = UserWithRecipes),
        (status = 400, description = "Already subscribed or subscribing to self", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(author_id): Path<i64>,
    Query(query): Query<SubscriptionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;

    let author: User = users::table
        .find(author_id)
        .select(User::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if author.id == user.id {
        return Err(ApiError::bad_request("You cannot subscribe to yourself."));
    }

    diesel::insert_into(subscriptions::table)
        .values(&NewSubscription {
            user_id: user.id,
            author_id: author.id,
        })
        .execute(&mut conn)
        .map_err(|e| {
            if is_unique_violation(&e, "subscriptions_user_author_key") {
                ApiError::bad_request("You are already subscribed to this user.")
            } else {
                e.into()
            }
        })?;

    tracing::debug!(user_id = user.id, author_id = author.id, "subscribed");

    let mut rows = with_recipes(&mut conn, &config, vec![author], query.recipes_limit)?;
    let body = rows
        .pop()
        .ok_or_else(|| ApiError::internal("subscribed author vanished"))?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = i64, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(author_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = pool.get()?;

    let author_exists: bool = diesel::select(diesel::dsl::exists(users::table.find(author_id)))
        .get_result(&mut conn)?;
    if !author_exists {
        return Err(ApiError::not_found("User"));
    }

    let deleted = diesel::delete(
        subscriptions::table
            .filter(subscriptions::user_id.eq(user.id))
            .filter(subscriptions::author_id.eq(author_id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::bad_request("You are not subscribed to this user."));
    }

    Ok(StatusCode::NO_CONTENT)
}
