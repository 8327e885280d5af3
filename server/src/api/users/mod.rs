pub mod avatar;
pub mod get;
pub mod list;
pub mod me;
pub mod register;
pub mod set_password;
pub mod subscribe;
pub mod subscriptions;

use std::collections::{HashMap, HashSet};

use crate::api::recipes::view::MinifiedRecipe;
use crate::api::ApiError;
use crate::config::Config;
use crate::images::image_url;
use crate::models::{Recipe, User};
use crate::schema::{recipes, subscriptions as subs};
use crate::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use diesel::prelude::*;
use foodgram_core::Page;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Public view of a user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the requesting user follows this one (always false for anonymous requests)
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserResponse {
    pub fn new(user: &User, is_subscribed: bool, config: &Config) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar_id.map(|id| image_url(config, id)),
        }
    }
}

/// An author as seen from the subscriptions page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserWithRecipes {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<MinifiedRecipe>,
    pub recipes_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserPage {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<UserResponse>,
}

impl From<Page<UserResponse>> for UserPage {
    fn from(page: Page<UserResponse>) -> Self {
        Self {
            count: page.count,
            next: page.next,
            previous: page.previous,
            results: page.results,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionPage {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<UserWithRecipes>,
}

impl From<Page<UserWithRecipes>> for SubscriptionPage {
    fn from(page: Page<UserWithRecipes>) -> Self {
        Self {
            count: page.count,
            next: page.next,
            previous: page.previous,
            results: page.results,
        }
    }
}

/// Ids out of `author_ids` that `viewer` is subscribed to.
pub fn subscribed_authors(
    conn: &mut PgConnection,
    viewer: Option<i64>,
    author_ids: &[i64],
) -> Result<HashSet<i64>, ApiError> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i64> = subs::table
        .filter(subs::user_id.eq(viewer))
        .filter(subs::author_id.eq_any(author_ids))
        .select(subs::author_id)
        .load(conn)?;

    Ok(ids.into_iter().collect())
}

/// Attach each author's newest recipes (at most `recipes_limit`, all when
/// `None`) and their total recipe count.
pub fn with_recipes(
    conn: &mut PgConnection,
    config: &Config,
    authors: Vec<User>,
    recipes_limit: Option<i64>,
) -> Result<Vec<UserWithRecipes>, ApiError> {
    let author_ids: Vec<i64> = authors.iter().map(|u| u.id).collect();

    let rows: Vec<Recipe> = if author_ids.is_empty() {
        Vec::new()
    } else {
        recipes::table
            .filter(recipes::author_id.eq_any(&author_ids))
            .order((recipes::pub_date.desc(), recipes::id.desc()))
            .select(Recipe::as_select())
            .load(conn)?
    };

    let mut by_author: HashMap<i64, Vec<Recipe>> = HashMap::new();
    for recipe in rows {
        by_author.entry(recipe.author_id).or_default().push(recipe);
    }

    let limit = recipes_limit
        .and_then(|l| usize::try_from(l).ok())
        .unwrap_or(usize::MAX);

    Ok(authors
        .into_iter()
        .map(|author| {
            let recipes = by_author.remove(&author.id).unwrap_or_default();
            let recipes_count = recipes.len() as i64;
            let shown = recipes
                .iter()
                .take(limit)
                .map(|r| MinifiedRecipe::new(r, config))
                .collect();
            UserWithRecipes {
                // Listed authors are always ones the viewer follows.
                user: UserResponse::new(&author, true, config),
                recipes: shown,
                recipes_count,
            }
        })
        .collect())
}

/// Returns the router for /api/users endpoints (mounted at /api/users)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_users).post(register::register))
        .route("/me", get(me::me))
        .route(
            "/me/avatar",
            put(avatar::set_avatar).delete(avatar::delete_avatar),
        )
        .route("/set_password", post(set_password::set_password))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/{id}", get(get::get_user))
        .route(
            "/{id}/subscribe",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        register::register,
        list::list_users,
        get::get_user,
        me::me,
        set_password::set_password,
        avatar::set_avatar,
        avatar::delete_avatar,
        subscriptions::list_subscriptions,
        subscribe::subscribe,
        subscribe::unsubscribe,
    ),
    components(schemas(
        UserResponse,
        UserWithRecipes,
        UserPage,
        SubscriptionPage,
        register::RegisterRequest,
        register::RegisterResponse,
        set_password::SetPasswordRequest,
        avatar::AvatarRequest,
        avatar::AvatarResponse,
    ))
)]
pub struct ApiDoc;
