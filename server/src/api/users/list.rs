use super::{subscribed_authors, UserPage, UserResponse};
use crate::api::{request_url, ApiError, ErrorResponse};
use crate::auth::MaybeUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::User;
use crate::schema::users;
use axum::{
    extract::{OriginalUri, Query, State},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use foodgram_core::{Page, PageRequest};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Paginated list of users", body = UserPage),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    )
)]
pub async fn list_users(
    viewer: MaybeUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    OriginalUri(uri): OriginalUri,
    Query(paging): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;

    let count: i64 = users::table.count().get_result(&mut conn)?;
    paging.check(count)?;

    let rows: Vec<User> = users::table
        .order((users::username.asc(), users::id.asc()))
        .limit(paging.limit())
        .offset(paging.offset())
        .select(User::as_select())
        .load(&mut conn)?;

    let ids: Vec<i64> = rows.iter().map(|u| u.id).collect();
    let subscribed = subscribed_authors(&mut conn, viewer.id(), &ids)?;

    let results = rows
        .iter()
        .map(|u| UserResponse::new(u, subscribed.contains(&u.id), &config))
        .collect();

    let page = Page::new(results, count, &paging, &request_url(&config, &uri));
    Ok(Json(UserPage::from(page)))
}
