//! Read-only tag and ingredient reference endpoints.

use super::error::ApiError;
use super::wire::{self, IngredientOut, TagOut};
use super::AppState;
use crate::database::models::{IngredientId, TagId};
use crate::query;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagOut>>, ApiError> {
    let mut conn = state.conn();
    let tags = query::all_tags(&mut conn)?;
    Ok(Json(tags.into_iter().map(wire::tag_out).collect()))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
) -> Result<Json<TagOut>, ApiError> {
    let mut conn = state.conn();
    let tag = query::tag_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("tag"))?;
    Ok(Json(wire::tag_out(tag)))
}

#[derive(Deserialize, Debug, Default)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(params): Query<IngredientQuery>,
) -> Result<Json<Vec<IngredientOut>>, ApiError> {
    let mut conn = state.conn();
    let ingredients = query::search_ingredients(&mut conn, params.name.as_deref())?;
    Ok(Json(
        ingredients.into_iter().map(wire::ingredient_out).collect(),
    ))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<IngredientId>,
) -> Result<Json<IngredientOut>, ApiError> {
    let mut conn = state.conn();
    let ingredient =
        query::ingredient_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("ingredient"))?;
    Ok(Json(wire::ingredient_out(ingredient)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    fn test_state() -> AppState {
        AppState::new(database::test_connection(), std::env::temp_dir())
    }

    #[tokio::test]
    async fn tags_list_is_sorted_by_name() {
        let state = test_state();
        {
            let mut conn = state.conn();
            query::insert_tag(&mut conn, "supper", "#FFAA00", "supper").unwrap();
            query::insert_tag(&mut conn, "breakfast", "#49B64E", "breakfast").unwrap();
        }
        let Json(tags) = list_tags(State(state.clone())).await.unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["breakfast", "supper"]);
    }

    #[tokio::test]
    async fn unknown_tag_is_not_found() {
        let state = test_state();
        let err = get_tag(State(state.clone()), Path(TagId(7)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("tag")));
    }

    #[tokio::test]
    async fn ingredient_search_is_a_prefix_match() {
        let state = test_state();
        {
            let mut conn = state.conn();
            query::get_or_create_ingredient(&mut conn, "flour", "g").unwrap();
            query::get_or_create_ingredient(&mut conn, "flaxseed", "g").unwrap();
            query::get_or_create_ingredient(&mut conn, "salt", "g").unwrap();
        }
        let Json(found) = list_ingredients(
            State(state.clone()),
            Query(IngredientQuery {
                name: Some("fl".into()),
            }),
        )
        .await
        .unwrap();
        let names: Vec<_> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["flaxseed", "flour"]);

        let Json(all) = list_ingredients(State(state.clone()), Query(IngredientQuery::default()))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn ingredient_search_treats_wildcards_literally() {
        let state = test_state();
        {
            let mut conn = state.conn();
            query::get_or_create_ingredient(&mut conn, "flour", "g").unwrap();
            query::get_or_create_ingredient(&mut conn, "100% rye flour", "g").unwrap();
        }
        let Json(found) = list_ingredients(
            State(state.clone()),
            Query(IngredientQuery {
                name: Some("%".into()),
            }),
        )
        .await
        .unwrap();
        assert!(found.is_empty());

        let Json(found) = list_ingredients(
            State(state.clone()),
            Query(IngredientQuery {
                name: Some("100%".into()),
            }),
        )
        .await
        .unwrap();
        let names: Vec<_> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["100% rye flour"]);
    }
}
