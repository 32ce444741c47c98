use axum::http::{header::AUTHORIZATION, header::COOKIE, request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{extract::FromRequestParts, Json};
use serde_json::json;
use tracing::warn;

use crate::db::{get_session, unix_now, DbPool};
use crate::error::AppError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

/// An authenticated request, via session cookie or `Authorization: Bearer`.
pub struct Auth {
    pub user_id: i64,
    pub session_id: String,
}

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        for candidate in session_candidates(parts) {
            if let Some(user_id) = check_session(&state.db, &candidate)? {
                return Ok(Auth {
                    user_id,
                    session_id: candidate,
                });
            }
        }

        warn!("Unauthorized API access attempt");
        Err(AuthError::Unauthorized)
    }
}

/// Bearer token first, then any `session` cookies.
fn session_candidates(parts: &Parts) -> Vec<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());

    let cookies = parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|s| {
            let mut parts = s.trim().splitn(2, '=');
            Some((parts.next()?, parts.next()?))
        })
        .filter(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string());

    bearer.into_iter().chain(cookies).collect()
}

fn check_session(db: &DbPool, id: &str) -> Result<Option<i64>, AppError> {
    Ok(get_session(db, id)?
        .filter(|session| session.expires_at > unix_now())
        .map(|session| session.user_id))
}

pub enum AuthError {
    Unauthorized,
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response(),
            AuthError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": msg })),
            )
                .into_response(),
        }
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Database(msg) => AuthError::Internal(msg),
            AppError::Unauthorized => AuthError::Unauthorized,
            AppError::NotFound => AuthError::Internal("Not found".to_string()),
            AppError::BadRequest(msg) | AppError::Conflict(msg) => {
                AuthError::Internal(msg.to_string())
            }
        }
    }
}
