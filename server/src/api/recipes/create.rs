use super::view::{load_recipe_view, RecipeResponse};
use crate::api::error::is_unique_violation;
use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::images::store_data_url;
use crate::models::{NewRecipe, NewRecipeIngredient, NewRecipeTag, Recipe};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use foodgram_core::{
    claim_unique_short_code, validate_amount, validate_cooking_time, validate_recipe, Claim,
    IngredientEntry, RecipeDraft, ShortCodeError, MAX_SHORT_CODE_ATTEMPTS,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct IngredientAmountRequest {
    /// Ingredient ID
    pub id: i64,
    pub amount: i64,
}

impl From<IngredientAmountRequest> for IngredientEntry {
    fn from(req: IngredientAmountRequest) -> Self {
        IngredientEntry {
            id: req.id,
            amount: req.amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<IngredientAmountRequest>,
    /// Tag IDs
    pub tags: Vec<i64>,
    /// Base64 data URL
    pub image: String,
    pub name: String,
    pub text: String,
    /// Minutes
    pub cooking_time: i64,
}

/// Validate the draft and make sure every referenced ingredient and tag exists.
pub(super) fn check_draft(
    conn: &mut PgConnection,
    name: &str,
    text: &str,
    cooking_time: i64,
    entries: &[IngredientEntry],
    tag_ids: &[i64],
) -> Result<(), ApiError> {
    validate_recipe(&RecipeDraft {
        name,
        text,
        cooking_time,
        ingredients: entries,
        tags: tag_ids,
    })?;

    let ingredient_ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
    let known: i64 = ingredients::table
        .filter(ingredients::id.eq_any(&ingredient_ids))
        .count()
        .get_result(conn)?;
    if known != ingredient_ids.len() as i64 {
        return Err(ApiError::field("ingredients", "Unknown ingredient."));
    }

    let known: i64 = tags::table
        .filter(tags::id.eq_any(tag_ids))
        .count()
        .get_result(conn)?;
    if known != tag_ids.len() as i64 {
        return Err(ApiError::field("tags", "Unknown tag."));
    }

    Ok(())
}

/// Insert the ingredient and tag links for a recipe. Callers replacing
/// links delete the old rows first.
pub(super) fn insert_links(
    conn: &mut PgConnection,
    recipe_id: i64,
    entries: &[IngredientEntry],
    tag_ids: &[i64],
) -> Result<(), ApiError> {
    let ingredient_rows = entries
        .iter()
        .map(|e| -> Result<NewRecipeIngredient, ApiError> {
            Ok(NewRecipeIngredient {
                recipe_id,
                ingredient_id: e.id,
                amount: validate_amount(e.amount)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    diesel::insert_into(recipe_ingredients::table)
        .values(&ingredient_rows)
        .execute(conn)?;

    let tag_rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&tag_rows)
        .execute(conn)?;

    Ok(())
}

struct RecipeFields<'a> {
    author_id: i64,
    name: &'a str,
    text: &'a str,
    image_id: Uuid,
    cooking_time: i16,
}

/// One claim attempt: cheap existence check, then the savepoint insert.
fn try_insert_recipe(
    conn: &mut PgConnection,
    fields: &RecipeFields<'_>,
    code: &str,
) -> Result<Claim<Recipe>, diesel::result::Error> {
    let taken: bool = diesel::select(diesel::dsl::exists(
        recipes::table.filter(recipes::short_code.eq(code)),
    ))
    .get_result(conn)?;
    if taken {
        return Ok(Claim::Taken);
    }
    insert_with_code(conn, fields, code)
}

/// Insert inside a savepoint. A writer that claimed `code` after the
/// existence check trips the unique constraint, and rolling back to the
/// savepoint leaves the outer transaction usable for the next attempt.
fn insert_with_code(
    conn: &mut PgConnection,
    fields: &RecipeFields<'_>,
    code: &str,
) -> Result<Claim<Recipe>, diesel::result::Error> {
    let inserted = conn.transaction::<Recipe, diesel::result::Error, _>(|conn| {
        diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                author_id: fields.author_id,
                name: fields.name,
                text: fields.text,
                image_id: fields.image_id,
                cooking_time: fields.cooking_time,
                short_code: code,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)
    });

    match inserted {
        Ok(recipe) => Ok(Claim::Claimed(recipe)),
        Err(e) if is_unique_violation(&e, "recipes_short_code_key") => Ok(Claim::Taken),
        Err(e) => Err(e),
    }
}

fn insert_recipe(conn: &mut PgConnection, fields: &RecipeFields<'_>) -> Result<Recipe, ApiError> {
    let mut rng = rand::rng();
    let (_, recipe) = claim_unique_short_code(&mut rng, MAX_SHORT_CODE_ATTEMPTS, |code| {
        try_insert_recipe(conn, fields, code)
    })
    .map_err(|e| match e {
        ShortCodeError::Storage(db) => ApiError::from(db),
        exhausted @ ShortCodeError::Exhausted { .. } => ApiError::internal(exhausted),
    })?;
    Ok(recipe)
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Json(req): Json<CreateRecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entries: Vec<IngredientEntry> = req.ingredients.iter().copied().map(Into::into).collect();
    let name = req.name.trim();
    let mut conn = pool.get()?;

    let recipe = conn.transaction::<Recipe, ApiError, _>(|conn| {
        check_draft(conn, name, &req.text, req.cooking_time, &entries, &req.tags)?;
        let cooking_time = validate_cooking_time(req.cooking_time)?;
        let image_id = store_data_url(conn, &req.image, "image")?;

        let recipe = insert_recipe(
            conn,
            &RecipeFields {
                author_id: user.id,
                name,
                text: &req.text,
                image_id,
                cooking_time,
            },
        )?;
        insert_links(conn, recipe.id, &entries, &req.tags)?;
        Ok(recipe)
    })?;

    tracing::info!(
        recipe_id = recipe.id,
        short_code = %recipe.short_code,
        author_id = user.id,
        "created recipe"
    );

    let body = load_recipe_view(&mut conn, &config, Some(user.id), recipe)?;
    Ok((StatusCode::CREATED, Json(body)))
}
