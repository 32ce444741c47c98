use axum::response::{IntoResponse, Response};
use axum::{http::StatusCode, Json};
use rusqlite::ErrorCode;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Database(String),
    Unauthorized,
    NotFound,
    BadRequest(&'static str),
    Conflict(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

const CONNECTION_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection.";

/// Failures talking to the data API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("invalid service url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }
}

/// Turns a client error into the text shown in the board's error banner.
pub fn user_message(err: &ClientError) -> String {
    match err {
        ClientError::Http(e) if e.is_connect() || e.is_timeout() => CONNECTION_MESSAGE.to_string(),
        other => other.to_string(),
    }
}
