use super::{with_recipes, SubscriptionPage};
use crate::api::{request_url, ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::User;
use crate::schema::{subscriptions, users};
use axum::{
    extract::{OriginalUri, Query, State},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use foodgram_core::{Page, PageRequest};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// How many of each author's recipes to include
    pub recipes_limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("recipes_limit" = Option<i64>, Query, description = "Recipes shown per author")
    ),
    responses(
        (status = 200, description = "Authors the user is subscribed to", body = SubscriptionPage),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<SubscriptionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let paging = PageRequest {
        page: query.page,
        limit: query.limit,
    };
    let mut conn = pool.get()?;

    let count: i64 = subscriptions::table
        .filter(subscriptions::user_id.eq(user.id))
        .count()
        .get_result(&mut conn)?;
    paging.check(count)?;

    let authors: Vec<User> = subscriptions::table
        .inner_join(users::table.on(users::id.eq(subscriptions::author_id)))
        .filter(subscriptions::user_id.eq(user.id))
        .order(subscriptions::author_id.asc())
        .limit(paging.limit())
        .offset(paging.offset())
        .select(User::as_select())
        .load(&mut conn)?;

    let results = with_recipes(&mut conn, &config, authors, query.recipes_limit)?;
    let page = Page::new(results, count, &paging, &request_url(&config, &uri));
    Ok(Json(SubscriptionPage::from(page)))
}
