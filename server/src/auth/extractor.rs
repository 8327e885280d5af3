use crate::api::{ApiError, ErrorResponse};
use crate::db::DbPool;
use crate::models::User;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::db::get_user_from_token;

/// Accepted `Authorization` schemes. `Token` is what the web client sends.
const AUTH_SCHEMES: &[&str] = &["Token ", "Bearer "];

/// Extractor that validates the Authorization header and provides the authenticated user.
///
/// Use this in any handler that requires authentication:
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     // user is the authenticated User
/// }
/// ```
pub struct AuthUser(pub User);

/// Like [`AuthUser`] but lets anonymous requests through as `None`.
/// A header that is present but invalid is still rejected.
pub struct MaybeUser(pub Option<User>);

#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader,
    InvalidFormat,
    InvalidToken,
    Lookup(ApiError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingHeader => "Authentication credentials were not provided.",
            AuthError::InvalidHeader => "Invalid Authorization header",
            AuthError::InvalidFormat => "Invalid Authorization header format",
            AuthError::InvalidToken => "Invalid or expired token",
            AuthError::Lookup(e) => return e.into_response(),
        };

        (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Pull the raw token out of the request headers.
/// `Ok(None)` means there was no Authorization header at all.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeader)?;

    let token = AUTH_SCHEMES
        .iter()
        .find_map(|scheme| auth_str.strip_prefix(scheme))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)?;

    Ok(Some(token))
}

async fn resolve_user<S>(parts: &mut Parts, state: &S) -> Result<Option<User>, AuthError>
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    let Some(token) = bearer_token(&parts.headers)? else {
        return Ok(None);
    };

    let pool = Arc::<DbPool>::from_ref(state);
    let user = get_user_from_token(&pool, token)
        .map_err(AuthError::Lookup)?
        .ok_or(AuthError::InvalidToken)?;

    Ok(Some(user))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(AuthUser)
            .ok_or(AuthError::MissingHeader)
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_user(parts, state).await?))
    }
}

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn headers_with(auth: Option<&str>) -> HeaderMap {
        let mut builder = Request::builder().uri("/api/users/me");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0.headers
    }

    #[test]
    fn test_no_header_is_anonymous() {
        assert!(matches!(bearer_token(&headers_with(None)), Ok(None)));
    }

    #[test]
    fn test_token_and_bearer_schemes() {
        let headers = headers_with(Some("Token abc123"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc123"));

        let headers = headers_with(Some("Bearer xyz"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("xyz"));
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let headers = headers_with(Some("Basic dXNlcjpwYXNz"));
        assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidFormat)));

        let headers = headers_with(Some("Token "));
        assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidFormat)));
    }
}
