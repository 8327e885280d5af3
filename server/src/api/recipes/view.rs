//! Response shapes for recipes and the bulk loading behind them.
//!
//! Listing pages load their recipes first and then fetch tags, ingredients,
//! authors and the viewer's favorite/cart flags with one query each, keyed
//! by recipe id.

use std::collections::{HashMap, HashSet};

use crate::api::tags::TagResponse;
use crate::api::users::{subscribed_authors, UserResponse};
use crate::api::ApiError;
use crate::config::Config;
use crate::images::image_url;
use crate::models::{Ingredient, Recipe, Tag, User};
use crate::schema::{
    favorites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_cart, tags, users,
};
use diesel::prelude::*;
use foodgram_core::Page;
use serde::Serialize;
use utoipa::ToSchema;

/// `{id, name, image, cooking_time}`, used by favorites, the cart and
/// subscription listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MinifiedRecipe {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i16,
}

impl MinifiedRecipe {
    pub fn new(recipe: &Recipe, config: &Config) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: image_url(config, recipe.image_id),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    /// Ingredient ID
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i16,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i16,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipePage {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<RecipeResponse>,
}

impl From<Page<RecipeResponse>> for RecipePage {
    fn from(page: Page<RecipeResponse>) -> Self {
        Self {
            count: page.count,
            next: page.next,
            previous: page.previous,
            results: page.results,
        }
    }
}

pub fn find_recipe(conn: &mut PgConnection, id: i64) -> Result<Recipe, ApiError> {
    recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Recipe"))
}

pub fn load_recipe_view(
    conn: &mut PgConnection,
    config: &Config,
    viewer: Option<i64>,
    recipe: Recipe,
) -> Result<RecipeResponse, ApiError> {
    load_recipe_views(conn, config, viewer, vec![recipe])?
        .pop()
        .ok_or_else(|| ApiError::internal("recipe view lost"))
}

/// Expand recipes into full responses, preserving their order.
pub fn load_recipe_views(
    conn: &mut PgConnection,
    config: &Config,
    viewer: Option<i64>,
    rows: Vec<Recipe>,
) -> Result<Vec<RecipeResponse>, ApiError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let author_ids: Vec<i64> = rows
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut tags_by_recipe: HashMap<i64, Vec<TagResponse>> = HashMap::new();
    let tag_rows: Vec<(i64, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&ids))
        .order(tags::name.asc())
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)?;
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(TagResponse::from(tag));
    }

    let mut ingredients_by_recipe: HashMap<i64, Vec<RecipeIngredientResponse>> = HashMap::new();
    let ingredient_rows: Vec<(i64, Ingredient, i16)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&ids))
        .order(recipe_ingredients::id.asc())
        .select((
            recipe_ingredients::recipe_id,
            Ingredient::as_select(),
            recipe_ingredients::amount,
        ))
        .load(conn)?;
    for (recipe_id, ingredient, amount) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount,
            });
    }

    let authors: HashMap<i64, User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select(User::as_select())
        .load::<User>(conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let subscribed = subscribed_authors(conn, viewer, &author_ids)?;

    let (favorited, in_cart): (HashSet<i64>, HashSet<i64>) = match viewer {
        Some(viewer) => (
            favorites::table
                .filter(favorites::user_id.eq(viewer))
                .filter(favorites::recipe_id.eq_any(&ids))
                .select(favorites::recipe_id)
                .load::<i64>(conn)?
                .into_iter()
                .collect(),
            shopping_cart::table
                .filter(shopping_cart::user_id.eq(viewer))
                .filter(shopping_cart::recipe_id.eq_any(&ids))
                .select(shopping_cart::recipe_id)
                .load::<i64>(conn)?
                .into_iter()
                .collect(),
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    rows.into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.author_id).ok_or_else(|| {
                ApiError::internal(format!("author of recipe {} missing", recipe.id))
            })?;
            Ok(RecipeResponse {
                id: recipe.id,
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                author: UserResponse::new(author, subscribed.contains(&author.id), config),
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                image: image_url(config, recipe.image_id),
                name: recipe.name,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}
