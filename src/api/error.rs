use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Request-level failures, mapped to structured JSON bodies. Nothing here
/// is fatal to the process.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("authentication required")]
    Unauthorized,

    #[error("you do not have permission to do that")]
    Forbidden,

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turns a unique-constraint violation into a user-facing conflict.
    /// Duplicate-insert races resolve here rather than via check-then-insert.
    pub fn conflict_on_unique(err: diesel::result::Error, message: &str) -> Self {
        match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::Conflict(message.into()),
            other => Self::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            log::error!("request failed: {self}");
        }
        let body = match &self {
            ApiError::Validation { field, message } => {
                let mut map = serde_json::Map::new();
                map.insert((*field).to_owned(), json!([message]));
                serde_json::Value::Object(map)
            }
            other => json!({ "message": other.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::validation("cooking_time", "must be non-negative").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("already exists".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("recipe").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("UNIQUE constraint failed".to_string()),
        );
        match ApiError::conflict_on_unique(err, "already in favorites") {
            ApiError::Conflict(message) => assert_eq!(message, "already in favorites"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn other_database_errors_pass_through() {
        match ApiError::conflict_on_unique(diesel::result::Error::NotFound, "unused") {
            ApiError::Database(diesel::result::Error::NotFound) => {}
            other => panic!("unexpected error {other:?}"),
        }
    }
}
