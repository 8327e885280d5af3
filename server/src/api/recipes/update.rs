use super::create::{check_draft, insert_links, IngredientAmountRequest};
use super::view::{find_recipe, load_recipe_view, RecipeResponse};
use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::images::{delete_image, store_data_url};
use crate::models::Recipe;
use crate::schema::{recipe_ingredients, recipe_tags, recipes};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use foodgram_core::{validate_cooking_time, IngredientEntry};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub ingredients: Vec<IngredientAmountRequest>,
    pub tags: Vec<i64>,
    /// New base64 data URL; the current image is kept when omitted
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
}

#[derive(AsChangeset)]
#[diesel(table_name = recipes)]
struct RecipeChanges<'a> {
    name: &'a str,
    text: &'a str,
    cooking_time: i16,
    image_id: Option<Uuid>,
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = pool.get()?;

    let existing = find_recipe(&mut conn, id)?;
    if existing.author_id != user.id {
        return Err(ApiError::Forbidden);
    }

    let entries: Vec<IngredientEntry> = req.ingredients.iter().copied().map(Into::into).collect();
    let name = req.name.trim();

    let recipe = conn.transaction::<Recipe, ApiError, _>(|conn| {
        check_draft(conn, name, &req.text, req.cooking_time, &entries, &req.tags)?;
        let cooking_time = validate_cooking_time(req.cooking_time)?;
        let image_id = req
            .image
            .as_deref()
            .map(|data_url| store_data_url(conn, data_url, "image"))
            .transpose()?;

        // short_code and pub_date are never touched here.
        let recipe = diesel::update(recipes::table.find(id))
            .set(&RecipeChanges {
                name,
                text: &req.text,
                cooking_time,
                image_id,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(id)))
            .execute(conn)?;
        diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(id))).execute(conn)?;
        insert_links(conn, id, &entries, &req.tags)?;

        Ok(recipe)
    })?;

    if recipe.image_id != existing.image_id {
        delete_image(&mut conn, existing.image_id);
    }

    tracing::info!(recipe_id = id, "updated recipe");

    let body = load_recipe_view(&mut conn, &config, Some(user.id), recipe)?;
    Ok(Json(body))
}
