use super::view::find_recipe;
use crate::api::{ApiError, ErrorResponse};
use crate::config::Config;
use crate::db::DbPool;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

pub fn short_link_url(config: &Config, short_code: &str) -> String {
    config.absolute_url(&format!("/r/{short_code}/"))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Short link for the recipe", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_link(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;

    Ok(Json(ShortLinkResponse {
        short_link: short_link_url(&config, &recipe.short_code),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_link_shape() {
        let config = crate::config::test_config();
        let body = ShortLinkResponse {
            short_link: short_link_url(&config, "aB3xY9"),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({"short-link": "http://foodgram.test/r/aB3xY9/"})
        );
    }
}
