use super::IngredientResponse;
use crate::api::{ApiError, ErrorResponse};
use crate::db::DbPool;
use crate::models::Ingredient;
use crate::schema::ingredients;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use foodgram_core::IngredientFilter;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(
        ("name" = Option<String>, Query, description = "Case-insensitive name prefix")
    ),
    responses(
        (status = 200, description = "Matching ingredients ordered by name", body = Vec<IngredientResponse>),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn list_ingredients(
    State(pool): State<Arc<DbPool>>,
    Query(filter): Query<IngredientFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;

    let mut query = ingredients::table
        .order((ingredients::name.asc(), ingredients::measurement_unit.asc()))
        .select(Ingredient::as_select())
        .into_boxed();

    if let Some(pattern) = filter.prefix_pattern() {
        query = query.filter(ingredients::name.ilike(pattern));
    }

    let rows: Vec<Ingredient> = query.load(&mut conn)?;
    Ok(Json(
        rows.into_iter()
            .map(IngredientResponse::from)
            .collect::<Vec<_>>(),
    ))
}
