use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{db, forms::FieldErrors};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("login required")]
    Unauthorized,

    #[error("admin rights required")]
    Forbidden,

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("invalid input")]
    Invalid(FieldErrors),

    #[error("conflicts with existing data: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AdminError {
    fn from(err: sqlx::Error) -> Self {
        if db::is_constraint_violation(&err) {
            AdminError::Conflict(err.to_string())
        } else {
            AdminError::Database(err)
        }
    }
}

impl From<FieldErrors> for AdminError {
    fn from(errors: FieldErrors) -> Self {
        AdminError::Invalid(errors)
    }
}

impl From<JsonRejection> for AdminError {
    fn from(rejection: JsonRejection) -> Self {
        let mut errors = FieldErrors::new();
        errors.push("body", rejection.body_text());
        AdminError::Invalid(errors)
    }
}

impl From<PathRejection> for AdminError {
    fn from(rejection: PathRejection) -> Self {
        let mut errors = FieldErrors::new();
        errors.push("id", rejection.body_text());
        AdminError::Invalid(errors)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminError::Unauthorized => StatusCode::UNAUTHORIZED,
            AdminError::Forbidden => StatusCode::FORBIDDEN,
            AdminError::NotFound { .. } => StatusCode::NOT_FOUND,
            AdminError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AdminError::Conflict(_) => StatusCode::CONFLICT,
            AdminError::Database(_) | AdminError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AdminError::Invalid(errors) => {
                let fields: Vec<_> = errors
                    .iter()
                    .map(|(field, message)| json!({ "field": field, "message": message }))
                    .collect();
                json!({ "error": self.to_string(), "fields": fields })
            }
            AdminError::Database(_) | AdminError::Internal(_) => {
                tracing::error!(error = %self, "admin request failed");
                json!({ "error": "internal error" })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
