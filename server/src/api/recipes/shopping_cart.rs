use super::view::{find_recipe, MinifiedRecipe};
use crate::api::error::is_unique_violation;
use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::NewShoppingCartItem;
use crate::schema::shopping_cart;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to the shopping cart", body = MinifiedRecipe),
        (status = 400, description = "Already in the shopping cart", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;

    diesel::insert_into(shopping_cart::table)
        .values(&NewShoppingCartItem {
            user_id: user.id,
            recipe_id: recipe.id,
        })
        .execute(&mut conn)
        .map_err(|e| {
            if is_unique_violation(&e, "shopping_cart_user_recipe_key") {
                ApiError::bad_request("Recipe is already in the shopping cart.")
            } else {
                e.into()
            }
        })?;

    Ok((StatusCode::CREATED, Json(MinifiedRecipe::new(&recipe, &config))))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from the shopping cart"),
        (status = 400, description = "Not in the shopping cart", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;

    let deleted = diesel::delete(
        shopping_cart::table
            .filter(shopping_cart::user_id.eq(user.id))
            .filter(shopping_cart::recipe_id.eq(recipe.id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::bad_request("Recipe is not in the shopping cart."));
    }
    Ok(StatusCode::NO_CONTENT)
}
