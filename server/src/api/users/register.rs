use crate::api::error::is_unique_violation;
use crate::api::{ApiError, ErrorResponse};
use crate::auth::hash_password;
use crate::db::DbPool;
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use foodgram_core::{validate_registration, Registration};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body(content = RegisterRequest, example = json!({
        "email": "vpupkin@yandex.ru",
        "username": "vasya.pupkin",
        "first_name": "Vasya",
        "last_name": "Pupkin",
        "password": "Qwerty123"
    })),
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Invalid data or email/username taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim();
    let username = req.username.trim();
    let first_name = req.first_name.trim();
    let last_name = req.last_name.trim();

    validate_registration(&Registration {
        email,
        username,
        first_name,
        last_name,
        password: &req.password,
    })?;

    let password_hash = hash_password(&req.password).map_err(ApiError::internal)?;

    let mut conn = pool.get()?;
    let user: User = diesel::insert_into(users::table)
        .values(&NewUser {
            email,
            username,
            first_name,
            last_name,
            password_hash: &password_hash,
        })
        .returning(User::as_returning())
        .get_result(&mut conn)
        .map_err(|e| {
            if is_unique_violation(&e, "users_email_key")
                || is_unique_violation(&e, "users_email_lower_idx")
            {
                ApiError::field("email", "A user with that email already exists.")
            } else if is_unique_violation(&e, "users_username_key") {
                ApiError::field("username", "A user with that username already exists.")
            } else {
                e.into()
            }
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}
