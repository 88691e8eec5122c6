//! Registration, profiles, password changes, and subscriptions.

use super::auth::{self, AuthUser};
use super::error::ApiError;
use super::wire::{self, PageQuery, Paginated, SubscribedAuthorOut, UserOut};
use super::AppState;
use crate::database;
use crate::database::models::{User, UserId};
use crate::query;
use crate::resolve::{Viewer, ViewerSets};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct RegisteredOut {
    pub email: String,
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<RegisteredOut>, ApiError> {
    for (field, value) in [
        ("email", &body.email),
        ("username", &body.username),
        ("first_name", &body.first_name),
        ("last_name", &body.last_name),
        ("password", &body.password),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::validation(field, "this field is required"));
        }
    }
    // `me` is routed as the current user's own profile
    if body.username == "me" {
        return Err(ApiError::validation("username", "this username is reserved"));
    }

    let mut conn = state.conn();
    let user = query::insert_user(
        &mut conn,
        &body.email,
        &body.username,
        &body.first_name,
        &body.last_name,
        &auth::hash_password(&body.password),
    )
    .map_err(|err| {
        ApiError::conflict_on_unique(err, "a user with that email or username already exists")
    })?;
    log::info!("registered user {}", user.username);
    Ok(Json(RegisteredOut {
        email: user.email,
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<UserOut>, ApiError> {
    let mut conn = state.conn();
    let sets = ViewerSets::load(&mut conn, Viewer::User(user.id))?;
    Ok(Json(wire::user_out(&user, &sets)))
}

pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserOut>, ApiError> {
    let mut conn = state.conn();
    let target = query::user_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("user"))?;
    let sets = ViewerSets::load(&mut conn, Viewer::User(viewer.id))?;
    Ok(Json(wire::user_out(&target, &sets)))
}

#[derive(Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn set_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if body.new_password.trim().is_empty() {
        return Err(ApiError::validation("new_password", "this field is required"));
    }
    if !auth::verify_password(&body.current_password, &user.password_hash) {
        return Err(ApiError::validation("current_password", "is incorrect"));
    }
    let mut conn = state.conn();
    query::set_password_hash(&mut conn, user.id, &auth::hash_password(&body.new_password))?;
    Ok(StatusCode::NO_CONTENT)
}

fn subscribed_author_out(
    conn: &mut database::Connection,
    author: &User,
    sets: &ViewerSets,
) -> Result<SubscribedAuthorOut, ApiError> {
    let handles = query::recipe_handles_by_author(conn, author.id)?;
    let recipes_count = crate::resolve::recipes_count(conn, author.id)?;
    Ok(SubscribedAuthorOut {
        user: wire::user_out(author, sets),
        recipes: handles.iter().map(wire::recipe_brief).collect(),
        recipes_count,
    })
}

pub async fn subscriptions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(page_query): Query<PageQuery>,
) -> Result<Json<Paginated<SubscribedAuthorOut>>, ApiError> {
    let mut conn = state.conn();
    let sets = ViewerSets::load(&mut conn, Viewer::User(user.id))?;
    let author_ids = query::subscribed_author_ids(&mut conn, user.id)?;
    let authors = query::users_by_ids(&mut conn, &author_ids)?;

    let (page, limit, offset) = page_query.window();
    let count = authors.len() as i64;
    let mut results = Vec::new();
    for author in authors
        .iter()
        .skip(offset as usize)
        .take(limit as usize)
    {
        results.push(subscribed_author_out(&mut conn, author, &sets)?);
    }
    Ok(Json(Paginated::new(count, page, limit, results)))
}

pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<UserId>,
) -> Result<(StatusCode, Json<SubscribedAuthorOut>), ApiError> {
    let mut conn = state.conn();
    let author = query::user_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("user"))?;
    query::add_subscription(&mut conn, user.id, id)
        .map_err(|err| ApiError::conflict_on_unique(err, "already subscribed to this user"))?;
    let sets = ViewerSets::load(&mut conn, Viewer::User(user.id))?;
    Ok((
        StatusCode::CREATED,
        Json(subscribed_author_out(&mut conn, &author, &sets)?),
    ))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn();
    query::user_by_id(&mut conn, id)?.ok_or(ApiError::NotFound("user"))?;
    if query::remove_subscription(&mut conn, user.id, id)? == 0 {
        return Err(ApiError::Conflict(
            "you are not subscribed to this user".into(),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        AppState::new(database::test_connection(), std::env::temp_dir())
    }

    async fn registered(state: &AppState, tag: &str) -> User {
        let Json(out) = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: format!("{tag}@example.com"),
                username: tag.into(),
                first_name: "Test".into(),
                last_name: "User".into(),
                password: "secret".into(),
            }),
        )
        .await
        .unwrap();
        let mut conn = state.conn();
        query::user_by_id(&mut conn, out.id).unwrap().unwrap()
    }

    #[tokio::test]
    async fn register_rejects_reserved_username() {
        let state = test_state();
        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: "me@example.com".into(),
                username: "me".into(),
                first_name: "Test".into(),
                last_name: "User".into(),
                password: "secret".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation {
                field: "username",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn register_enforces_unique_username() {
        let state = test_state();
        registered(&state, "cook").await;
        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: "other@example.com".into(),
                username: "cook".into(),
                first_name: "Test".into(),
                last_name: "User".into(),
                password: "secret".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn set_password_requires_current() {
        let state = test_state();
        let user = registered(&state, "cook").await;

        let err = set_password(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(SetPasswordRequest {
                current_password: "wrong".into(),
                new_password: "updated".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation {
                field: "current_password",
                ..
            }
        ));

        let status = set_password(
            State(state.clone()),
            AuthUser(user.clone()),
            Json(SetPasswordRequest {
                current_password: "secret".into(),
                new_password: "updated".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let mut conn = state.conn();
        let stored = query::user_by_id(&mut conn, user.id).unwrap().unwrap();
        assert!(auth::verify_password("updated", &stored.password_hash));
    }

    #[tokio::test]
    async fn subscribe_once_then_conflict() {
        let state = test_state();
        let follower = registered(&state, "follower").await;
        let author = registered(&state, "author").await;

        let (status, Json(out)) = subscribe(
            State(state.clone()),
            AuthUser(follower.clone()),
            Path(author.id),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(out.user.is_subscribed);
        assert_eq!(out.recipes_count, 0);

        let err = subscribe(
            State(state.clone()),
            AuthUser(follower.clone()),
            Path(author.id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let Json(page) = subscriptions(
            State(state.clone()),
            AuthUser(follower.clone()),
            Query(PageQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].user.username, "author");

        let status = unsubscribe(State(state.clone()), AuthUser(follower.clone()), Path(author.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = unsubscribe(State(state.clone()), AuthUser(follower), Path(author.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn unsubscribe_unknown_user_is_not_found() {
        let state = test_state();
        let follower = registered(&state, "follower").await;
        let err = unsubscribe(
            State(state.clone()),
            AuthUser(follower),
            Path(UserId(999)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("user")));
    }
}
