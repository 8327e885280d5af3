//! Short-link resolution: `/r/{short_code}` redirects to the recipe page.

use crate::api::{ApiError, ErrorResponse};
use crate::config::Config;
use crate::db::DbPool;
use crate::schema::recipes;
use crate::AppState;
use axum::routing::get;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Router,
};
use diesel::prelude::*;
use foodgram_core::is_valid_short_code;
use std::sync::Arc;
use utoipa::OpenApi;

/// Returns the router for short links (merged at the root)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/r/{short_code}", get(resolve_short_link))
        .route("/api/recipes-short/{short_code}", get(resolve_api_short_link))
}

pub fn recipe_page_url(config: &Config, recipe_id: i64) -> String {
    config.absolute_url(&format!("/recipes/{recipe_id}/"))
}

fn redirect(
    pool: &DbPool,
    config: &Config,
    short_code: &str,
) -> Result<impl IntoResponse, ApiError> {
    // Malformed codes cannot exist in the table.
    if !is_valid_short_code(short_code) {
        return Err(ApiError::not_found("Recipe"));
    }

    let mut conn = pool.get()?;
    let recipe_id: i64 = recipes::table
        .filter(recipes::short_code.eq(short_code))
        .select(recipes::id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Recipe"))?;

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, recipe_page_url(config, recipe_id))],
    ))
}

#[utoipa::path(
    get,
    path = "/r/{short_code}",
    tag = "short links",
    params(
        ("short_code" = String, Path, description = "Six-character recipe code")
    ),
    responses(
        (status = 302, description = "Redirect to the recipe page"),
        (status = 404, description = "Unknown code", body = ErrorResponse)
    )
)]
pub async fn resolve_short_link(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(short_code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    redirect(&pool, &config, &short_code)
}

#[utoipa::path(
    get,
    path = "/api/recipes-short/{short_code}",
    tag = "short links",
    params(
        ("short_code" = String, Path, description = "Six-character recipe code")
    ),
    responses(
        (status = 302, description = "Redirect to the recipe page"),
        (status = 404, description = "Unknown code", body = ErrorResponse)
    )
)]
pub async fn resolve_api_short_link(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(short_code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    redirect(&pool, &config, &short_code)
}

#[derive(OpenApi)]
#[openapi(paths(resolve_short_link, resolve_api_short_link))]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_page_url() {
        let config = crate::config::test_config();
        assert_eq!(recipe_page_url(&config, 42), "http://foodgram.test/recipes/42/");
    }

    #[tokio::test]
    async fn test_stored_code_redirects_to_recipe() {
        let Some(pool) = crate::db::test_pool() else {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        };
        let recipe = {
            let mut conn = pool.get().unwrap();
            let author = crate::db::fixtures::user(&mut conn, "short_link_author");
            crate::db::fixtures::recipe(&mut conn, author.id, "Ab12Cd")
        };

        let state = AppState {
            pool: Arc::new(pool),
            config: Arc::new(crate::config::test_config()),
        };
        let server = axum_test::TestServer::new(crate::app::router(state)).unwrap();

        for path in ["/r/Ab12Cd", "/api/recipes-short/Ab12Cd"] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::FOUND);
            let location = response.header(header::LOCATION);
            assert!(location
                .to_str()
                .unwrap()
                .ends_with(&format!("/recipes/{}/", recipe.id)));
        }

        // Codes are case-sensitive.
        server
            .get("/r/ab12cd")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
