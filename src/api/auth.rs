//! Token auth boundary. Issues opaque keys at login, resolves the
//! `Authorization: Token <key>` header to a [`Viewer`] before any core
//! logic runs.

use super::error::ApiError;
use super::AppState;
use crate::database::models::User;
use crate::query;
use crate::resolve::Viewer;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use rand::RngCore as _;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest as _, Sha256};

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    hash_with_salt(&salt, password)
}

fn hash_with_salt(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    format!("{}${}", hex::encode(salt), hex::encode(hasher.finalize()))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, _)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    hash_with_salt(&salt, password) == stored
}

fn generate_token_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Token ")
}

/// A missing header means an anonymous viewer; a header with an unknown
/// key is rejected outright.
impl FromRequestParts<AppState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(key) = token_from_headers(&parts.headers) else {
            return Ok(Viewer::Anonymous);
        };
        let mut conn = state.conn();
        match query::token_user(&mut conn, key)? {
            Some(user_id) => Ok(Viewer::User(user_id)),
            None => Err(ApiError::Unauthorized),
        }
    }
}

/// The authenticated user behind the request, for handlers that require
/// authentication.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = token_from_headers(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let mut conn = state.conn();
        let user_id = query::token_user(&mut conn, key)?.ok_or(ApiError::Unauthorized)?;
        let user = query::user_by_id(&mut conn, user_id)?.ok_or(ApiError::Unauthorized)?;
        Ok(AuthUser(user))
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn();
    let user = query::user_by_email(&mut conn, &body.email)?.ok_or(ApiError::Unauthorized)?;
    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }
    let key = generate_token_key();
    query::insert_token(&mut conn, user.id, &key)?;
    log::info!("issued token for user {}", user.username);
    Ok(Json(json!({ "auth_token": key })))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let key = token_from_headers(&headers).ok_or(ApiError::Unauthorized)?;
    let mut conn = state.conn();
    if query::delete_token(&mut conn, key)? == 0 {
        return Err(ApiError::Unauthorized);
    }
    Ok(StatusCode::NO_CONTENT)
}
