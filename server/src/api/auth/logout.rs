use crate::api::{ApiError, ErrorResponse};
use crate::auth::{bearer_token, delete_session, AuthUser};
use crate::db::DbPool;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/token/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn logout(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    // AuthUser has already validated the header.
    let token = bearer_token(&headers)
        .ok()
        .flatten()
        .ok_or(ApiError::Unauthorized)?;

    let mut conn = pool.get()?;
    delete_session(&mut conn, token)?;
    tracing::info!(user_id = user.id, "user logged out");

    Ok(StatusCode::NO_CONTENT)
}
