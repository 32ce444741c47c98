use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde_json::json;
use tracing::info;

use crate::auth::{generate_session_id, hash_password, verify_password, SESSION_TTL_SECS};
use crate::db::{
    create_session, create_user, delete_session, get_password_hash, get_user_with_hash,
    set_password_hash, unix_now, update_username,
};
use crate::error::AppError;
use crate::middleware::{Auth, SESSION_COOKIE};
use crate::models::{ChangePassword, Credentials, LoginResponse, Session, UpdateProfile, User};
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username cannot be empty"));
    }
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password cannot be empty"));
    }

    let hash = hash_password(&req.password)?;
    let user = create_user(&state.db, username, &hash)?;
    info!(id = user.id, username = %user.username, "Registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<Credentials>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let (user, hash) = get_user_with_hash(&state.db, req.username.trim())?
        .ok_or(AppError::Unauthorized)?;
    if !verify_password(&req.password, &hash) {
        return Err(AppError::Unauthorized);
    }

    let now = unix_now();
    let session = Session {
        id: generate_session_id(),
        user_id: user.id,
        created_at: now,
        expires_at: now + SESSION_TTL_SECS,
    };
    create_session(&state.db, &session)?;
    info!(user_id = user.id, "User logged in");

    let cookie = Cookie::build((SESSION_COOKIE, session.id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS));

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token: session.id,
            user,
        }),
    ))
}

pub async fn logout(
    auth: Auth,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, impl IntoResponse), AppError> {
    delete_session(&state.db, &auth.session_id)?;
    info!(user_id = auth.user_id, "User logged out");

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(0));

    Ok((jar.remove(cookie), Json(json!({ "success": true }))))
}

pub async fn update_profile(
    auth: Auth,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfile>,
) -> Result<Json<User>, AppError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username cannot be empty"));
    }

    let user = update_username(&state.db, auth.user_id, username)?.ok_or(AppError::NotFound)?;
    info!(user_id = user.id, username = %user.username, "Updated profile");
    Ok(Json(user))
}

pub async fn change_password(
    auth: Auth,
    State(state): State<AppState>,
    Json(req): Json<ChangePassword>,
) -> Result<impl IntoResponse, AppError> {
    if req.new_password.is_empty() {
        return Err(AppError::BadRequest("Password cannot be empty"));
    }
    let hash = get_password_hash(&state.db, auth.user_id)?.ok_or(AppError::NotFound)?;
    if !verify_password(&req.current_password, &hash) {
        return Err(AppError::Unauthorized);
    }

    let new_hash = hash_password(&req.new_password)?;
    set_password_hash(&state.db, auth.user_id, &new_hash)?;
    info!(user_id = auth.user_id, "Changed password");
    Ok(Json(json!({ "success": true })))
}
