use super::view::{load_recipe_views, RecipePage};
use crate::api::{request_url, ApiError, ErrorResponse};
use crate::auth::MaybeUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::Recipe;
use crate::schema::{favorites, recipe_tags, recipes, shopping_cart, tags};
use axum::{
    extract::{OriginalUri, Query, State},
    response::IntoResponse,
    Json,
};
use diesel::pg::Pg;
use diesel::prelude::*;
use foodgram_core::{Membership, Page, PageRequest, RecipeFilter};
use std::sync::Arc;

/// Base query with every filter applied, shared by the count and the page.
fn filtered_recipes<'a>(
    filter: &'a RecipeFilter,
    viewer: Option<i64>,
) -> recipes::BoxedQuery<'a, Pg> {
    let mut query = recipes::table.into_boxed();

    if !filter.tags.is_empty() {
        let tagged = recipe_tags::table
            .inner_join(tags::table)
            .filter(tags::slug.eq_any(&filter.tags))
            .select(recipe_tags::recipe_id);
        query = query.filter(recipes::id.eq_any(tagged));
    }

    if let Some(author) = filter.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    if let Some(viewer) = viewer {
        let favorited = favorites::table
            .filter(favorites::user_id.eq(viewer))
            .select(favorites::recipe_id);
        match filter.favorited_for(true) {
            Membership::Only => query = query.filter(recipes::id.eq_any(favorited)),
            Membership::Exclude => query = query.filter(recipes::id.ne_all(favorited)),
            Membership::Any | Membership::Nothing => {}
        }

        let in_cart = shopping_cart::table
            .filter(shopping_cart::user_id.eq(viewer))
            .select(shopping_cart::recipe_id);
        match filter.in_shopping_cart_for(true) {
            Membership::Only => query = query.filter(recipes::id.eq_any(in_cart)),
            Membership::Exclude => query = query.filter(recipes::id.ne_all(in_cart)),
            Membership::Any | Membership::Nothing => {}
        }
    }

    query
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("tags" = Option<Vec<String>>, Query, description = "Tag slugs, repeatable; any match"),
        ("author" = Option<i64>, Query, description = "Author ID"),
        ("is_favorited" = Option<i32>, Query, description = "1 for favorites only, 0 to exclude them"),
        ("is_in_shopping_cart" = Option<i32>, Query, description = "1 for cart only, 0 to exclude it")
    ),
    responses(
        (status = 200, description = "Paginated recipes, newest first", body = RecipePage),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    viewer: MaybeUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    OriginalUri(uri): OriginalUri,
    Query(paging): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = RecipeFilter::from_query(uri.query());
    let viewer_id = viewer.id();
    let authenticated = viewer_id.is_some();
    let this_url = request_url(&config, &uri);

    // Anonymous users have no favorites or cart to match against.
    if filter.favorited_for(authenticated) == Membership::Nothing
        || filter.in_shopping_cart_for(authenticated) == Membership::Nothing
    {
        paging.check(0)?;
        let page: Page<_> = Page::new(Vec::new(), 0, &paging, &this_url);
        return Ok(Json(RecipePage::from(page)));
    }

    let mut conn = pool.get()?;

    let count: i64 = filtered_recipes(&filter, viewer_id)
        .count()
        .get_result(&mut conn)?;
    paging.check(count)?;

    let rows: Vec<Recipe> = filtered_recipes(&filter, viewer_id)
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .limit(paging.limit())
        .offset(paging.offset())
        .select(Recipe::as_select())
        .load(&mut conn)?;

    let results = load_recipe_views(&mut conn, &config, viewer_id, rows)?;
    let page = Page::new(results, count, &paging, &this_url);
    Ok(Json(RecipePage::from(page)))
}
