//! Recipe CRUD plus the per-recipe favorite / shopping-cart actions and
//! the shopping-list download.

use super::auth::AuthUser;
use super::error::ApiError;
use super::wire::{self, Paginated, RecipeBrief, RecipeOut};
use super::AppState;
use crate::cart;
use crate::database;
use crate::database::models::{IngredientId, Recipe, RecipeId, TagId, UserId};
use crate::image;
use crate::query;
use crate::resolve::{Viewer, ViewerSets};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use diesel::Connection as _;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

#[derive(Deserialize, Debug)]
pub struct IngredientLineIn {
    pub id: IngredientId,
    pub amount: i32,
}

#[derive(Deserialize, Debug)]
pub struct RecipeIn {
    pub ingredients: Vec<IngredientLineIn>,
    pub tags: Vec<TagId>,
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

fn validate(body: &RecipeIn, require_image: bool) -> Result<(), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::validation("name", "this field is required"));
    }
    if body.text.trim().is_empty() {
        return Err(ApiError::validation("text", "this field is required"));
    }
    if body.cooking_time < 0 {
        return Err(ApiError::validation("cooking_time", "must be non-negative"));
    }
    if body.tags.is_empty() {
        return Err(ApiError::validation("tags", "at least one tag is required"));
    }
    let mut seen_tags = HashSet::new();
    for tag in &body.tags {
        if !seen_tags.insert(*tag) {
            return Err(ApiError::validation("tags", format!("duplicate tag {tag}")));
        }
    }
    if body.ingredients.is_empty() {
        return Err(ApiError::validation(
            "ingredients",
            "at least one ingredient is required",
        ));
    }
    let mut seen = HashSet::new();
    for line in &body.ingredients {
        if line.amount < 0 {
            return Err(ApiError::validation("ingredients", "amount must be non-negative"));
        }
        if !seen.insert(line.id) {
            return Err(ApiError::validation(
                "ingredients",
                format!("duplicate ingredient {}", line.id),
            ));
        }
    }
    if require_image && body.image.is_none() {
        return Err(ApiError::validation("image", "this field is required"));
    }
    Ok(())
}

/// Every referenced tag and ingredient must exist before anything is
/// written.
fn check_refs(conn: &mut database::Connection, body: &RecipeIn) -> Result<(), ApiError> {
    let tag_ids: HashSet<TagId> = body.tags.iter().copied().collect();
    if query::tags_by_ids(conn, &body.tags)?.len() != tag_ids.len() {
        return Err(ApiError::NotFound("tag"));
    }
    let ingredient_ids: Vec<IngredientId> = body.ingredients.iter().map(|line| line.id).collect();
    if query::ingredients_by_ids(conn, &ingredient_ids)?.len() != ingredient_ids.len() {
        return Err(ApiError::NotFound("ingredient"));
    }
    Ok(())
}

fn recipe_response(
    conn: &mut database::Connection,
    recipe: &Recipe,
    sets: &ViewerSets,
) -> Result<RecipeOut, ApiError> {
    let author = query::user_by_id(conn, recipe.author_id)?.ok_or(ApiError::NotFound("user"))?;
    let tags = query::recipe_tag_list(conn, recipe.id)?;
    let lines = query::recipe_ingredient_lines(conn, recipe.id)?;
    Ok(wire::recipe_out(recipe, &author, tags, lines, sets))
}

#[derive(Deserialize, Debug, Default)]
pub struct RecipeListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
    pub author: Option<UserId>,
    /// Comma-separated tag slugs.
    pub tags: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some(v) if v != "0" && v != "false")
}

pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<RecipeListQuery>,
) -> Result<Json<Paginated<RecipeOut>>, ApiError> {
    let mut conn = state.conn();
    let sets = ViewerSets::load(&mut conn, viewer)?;

    let mut restrict: Option<HashSet<RecipeId>> = None;
    let narrow = |ids: Vec<RecipeId>, restrict: &mut Option<HashSet<RecipeId>>| {
        let ids: HashSet<RecipeId> = ids.into_iter().collect();
        match restrict {
            None => *restrict = Some(ids),
            Some(current) => current.retain(|id| ids.contains(id)),
        }
    };
    // Viewer-relative filters resolve to the empty set for anonymous
    // viewers, so they see no results rather than someone else's.
    if flag(&params.is_favorited) {
        let ids = match viewer.user_id() {
            Some(user) => query::favorite_recipe_ids(&mut conn, user)?,
            None => vec![],
        };
        narrow(ids, &mut restrict);
    }
    if flag(&params.is_in_shopping_cart) {
        let ids = match viewer.user_id() {
            Some(user) => query::cart_recipe_ids(&mut conn, user)?,
            None => vec![],
        };
        narrow(ids, &mut restrict);
    }
    if let Some(tags_param) = &params.tags {
        let slugs: Vec<String> = tags_param.split(',').map(str::to_owned).collect();
        narrow(query::recipe_ids_with_tag_slugs(&mut conn, &slugs)?, &mut restrict);
    }

    let filter = query::RecipeFilter {
        author: params.author,
        restrict_to: restrict.map(|ids| ids.into_iter().collect()),
    };
    let page_query = wire::PageQuery {
        page: params.page,
        limit: params.limit,
    };
    let (page, limit, offset) = page_query.window();
    let count = query::count_recipes(&mut conn, &filter)?;
    let recipes = query::list_recipes(&mut conn, &filter, limit, offset)?;

    let author_ids: Vec<UserId> = {
        let distinct: HashSet<UserId> = recipes.iter().map(|r| r.author_id).collect();
        distinct.into_iter().collect()
    };
    let authors: HashMap<UserId, _> = query::users_by_ids(&mut conn, &author_ids)?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let mut results = Vec::with_capacity(recipes.len());
    for recipe in &recipes {
        let author = authors
            .get(&recipe.author_id)
            .ok_or(ApiError::NotFound("user"))?;
        let tags = query::recipe_tag_list(&mut conn, recipe.id)?;
        let lines = query::recipe_ingredient_lines(&mut conn, recipe.id)?;
        results.push(wire::recipe_out(recipe, author, tags, lines, &sets));
    }
    Ok(Json(Paginated::new(count, page, limit, results)))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeOut>, ApiError> {
    let mut conn = state.conn();
    let recipe = query::recipe_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("recipe"))?;
    let sets = ViewerSets::load(&mut conn, viewer)?;
    Ok(Json(recipe_response(&mut conn, &recipe, &sets)?))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<RecipeIn>,
) -> Result<(StatusCode, Json<RecipeOut>), ApiError> {
    validate(&body, true)?;
    let decoded = image::decode_data_url(body.image.as_deref().unwrap_or_default())
        .map_err(|err| ApiError::validation("image", err.to_string()))?;

    let mut conn = state.conn();
    check_refs(&mut conn, &body)?;
    let lines: Vec<(IngredientId, i32)> = body
        .ingredients
        .iter()
        .map(|line| (line.id, line.amount))
        .collect();

    let recipe = conn.transaction(|conn| {
        let recipe = query::insert_recipe(conn, user.id, &body.name, &body.text, body.cooking_time)?;
        query::replace_recipe_ingredients(conn, recipe.id, &lines)?;
        query::replace_recipe_tags(conn, recipe.id, &body.tags)?;
        let path = image::store(&state.media_dir, recipe.id, &decoded)?;
        query::set_recipe_image(conn, recipe.id, &path)?;
        query::recipe_by_id(conn, recipe.id)?.ok_or(ApiError::NotFound("recipe"))
    })?;
    log::info!("user {} published recipe {}", user.username, recipe.id);

    let sets = ViewerSets::load(&mut conn, Viewer::User(user.id))?;
    Ok((
        StatusCode::CREATED,
        Json(recipe_response(&mut conn, &recipe, &sets)?),
    ))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<RecipeId>,
    Json(body): Json<RecipeIn>,
) -> Result<Json<RecipeOut>, ApiError> {
    let mut conn = state.conn();
    let existing = query::recipe_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("recipe"))?;
    if existing.author_id != user.id {
        return Err(ApiError::Forbidden);
    }
    validate(&body, false)?;
    let decoded = match body.image.as_deref() {
        Some(data_url) => Some(
            image::decode_data_url(data_url)
                .map_err(|err| ApiError::validation("image", err.to_string()))?,
        ),
        None => None,
    };
    check_refs(&mut conn, &body)?;
    let lines: Vec<(IngredientId, i32)> = body
        .ingredients
        .iter()
        .map(|line| (line.id, line.amount))
        .collect();

    // Full replace: the recipe's association sets equal exactly the new
    // payload afterwards, stale rows included.
    let recipe = conn.transaction(|conn| {
        query::update_recipe(conn, id, &body.name, &body.text, body.cooking_time)?;
        query::replace_recipe_ingredients(conn, id, &lines)?;
        query::replace_recipe_tags(conn, id, &body.tags)?;
        if let Some(decoded) = &decoded {
            let path = image::store(&state.media_dir, id, decoded)?;
            query::set_recipe_image(conn, id, &path)?;
        }
        query::recipe_by_id(conn, id)?.ok_or(ApiError::NotFound("recipe"))
    })?;

    let sets = ViewerSets::load(&mut conn, Viewer::User(user.id))?;
    Ok(Json(recipe_response(&mut conn, &recipe, &sets)?))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn();
    let existing = query::recipe_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("recipe"))?;
    if existing.author_id != user.id {
        return Err(ApiError::Forbidden);
    }
    query::delete_recipe(&mut conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<RecipeId>,
) -> Result<(StatusCode, Json<RecipeBrief>), ApiError> {
    let mut conn = state.conn();
    let handle =
        query::recipe_handle_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("recipe"))?;
    query::add_favorite(&mut conn, user.id, id)
        .map_err(|err| ApiError::conflict_on_unique(err, "recipe is already in favorites"))?;
    Ok((StatusCode::CREATED, Json(wire::recipe_brief(&handle))))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn();
    query::recipe_handle_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("recipe"))?;
    if query::remove_favorite(&mut conn, user.id, id)? == 0 {
        return Err(ApiError::Conflict("recipe is not in favorites".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<RecipeId>,
) -> Result<(StatusCode, Json<RecipeBrief>), ApiError> {
    let mut conn = state.conn();
    let handle =
        query::recipe_handle_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("recipe"))?;
    query::add_cart_entry(&mut conn, user.id, id).map_err(|err| {
        ApiError::conflict_on_unique(err, "recipe is already in the shopping cart")
    })?;
    Ok((StatusCode::CREATED, Json(wire::recipe_brief(&handle))))
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn();
    query::recipe_handle_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("recipe"))?;
    if query::remove_cart_entry(&mut conn, user.id, id)? == 0 {
        return Err(ApiError::Conflict("recipe is not in the shopping cart".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.conn();
    let lines = cart::shopping_list(&mut conn, user.id)?;
    if lines.is_empty() {
        return Err(ApiError::Conflict("shopping cart is empty".into()));
    }
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart.txt\"",
            ),
        ],
        cart::render(&lines),
    ))
}
