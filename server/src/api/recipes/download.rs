use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::schema::{ingredients, recipe_ingredients, shopping_cart};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use diesel::prelude::*;
use foodgram_core::{render_shopping_list, IngredientAmount};
use std::sync::Arc;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    responses(
        (status = 200, description = "Aggregated shopping list", content_type = "text/plain", body = String),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;

    let rows: Vec<(String, String, i16)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .inner_join(
            shopping_cart::table.on(shopping_cart::recipe_id.eq(recipe_ingredients::recipe_id)),
        )
        .filter(shopping_cart::user_id.eq(user.id))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(&mut conn)?;

    let row_count = rows.len();
    let text = render_shopping_list(
        rows.into_iter()
            .map(|(name, unit, amount)| IngredientAmount::new(name, unit, i32::from(amount))),
    );
    tracing::debug!(user_id = user.id, row_count, "rendered shopping list");

    Ok(shopping_list_response(text))
}

/// Wrap the rendered list as a plain-text attachment.
fn shopping_list_response(text: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
            ),
        ],
        text,
    )
        .into_response()
}
