use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RosterError {
    #[error("user already exists with email: {email}")]
    Conflict { email: String },

    #[error("user not found")]
    NotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl RosterError {
    /// True when the underlying database error is a unique-constraint
    /// violation (duplicate email on insert).
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
    }

    /// True when the database reports that a DDL target (table, index)
    /// already exists. SQLite surfaces this as a plain error whose message
    /// carries "already exists" rather than a dedicated code.
    pub fn is_already_exists(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.message().contains("already exists"))
    }
}

/// Serialized error payload; keeps the `success` flag every endpoint carries.
#[derive(Debug, Serialize)]
struct ApiErrorBody {
    success: bool,
    error: ApiErrorObject,
}

#[derive(Debug, Serialize)]
struct ApiErrorObject {
    code: String,
    message: String,
}

impl IntoResponse for RosterError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            RosterError::Conflict { email } => (
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("A user already exists with email: {email}"),
            ),

            RosterError::NotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "User not found.".to_string(),
            ),

            RosterError::InvalidInput(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_INPUT",
                reason.clone(),
            ),

            RosterError::Database(_) | RosterError::Unexpected(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ApiErrorBody {
            success: false,
            error: ApiErrorObject {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
