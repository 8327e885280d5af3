pub mod auth;
pub mod error;
pub mod health;
pub mod ingredients;
pub mod media;
pub mod recipes;
pub mod short_link;
pub mod tags;
pub mod users;

pub use error::ApiError;

use axum::http::Uri;
use serde::Serialize;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

use crate::config::Config;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Name of the offending request field, for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: None,
        }
    }
}

/// Absolute URL of the current request, used for pagination links.
pub fn request_url(config: &Config, uri: &Uri) -> String {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    config.absolute_url(path)
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Foodgram API", description = "Recipes, shopping carts and short links"),
        components(schemas(ErrorResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    // "Authorization: Token <key>"
    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "token_auth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Token <key> (Bearer <key> is also accepted)",
            ))),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        health::ApiDoc::openapi(),
        auth::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        tags::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        short_link::ApiDoc::openapi(),
        media::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_omits_empty_field() {
        let json = serde_json::to_value(ErrorResponse::new("Not found.")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Not found."}));
    }

    #[test]
    fn test_request_url_keeps_query() {
        let config = crate::config::test_config();
        let uri: Uri = "/api/recipes?page=2&tags=lunch".parse().unwrap();
        assert_eq!(
            request_url(&config, &uri),
            "http://foodgram.test/api/recipes?page=2&tags=lunch"
        );
    }

    #[test]
    fn test_openapi_has_core_paths() {
        let spec = openapi();
        for path in [
            "/api/recipes",
            "/api/recipes/{id}/get-link",
            "/api/recipes/download_shopping_cart",
            "/r/{short_code}",
            "/api/users/subscriptions",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
