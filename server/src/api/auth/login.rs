use crate::api::{ApiError, ErrorResponse};
use crate::auth::{create_session, verify_password};
use crate::db::DbPool;
use crate::models::User;
use crate::schema::users;
use axum::{extract::State, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub auth_token: String,
}

const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[utoipa::path(
    post,
    path = "/api/auth/token/login",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"email": "vpupkin@yandex.ru", "password": "Qwerty123"})),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;

    let user: Option<User> = users::table
        .filter(
            diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(email) = LOWER(")
                .bind::<diesel::sql_types::Text, _>(req.email.trim())
                .sql(")"),
        )
        .select(User::as_select())
        .first(&mut conn)
        .optional()?;

    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    };

    let auth_token = create_session(&mut conn, user.id)?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(LoginResponse { auth_token }))
}
