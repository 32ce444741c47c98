pub mod auth;
pub mod board;
pub mod client;
pub mod config;
pub mod db;
pub mod drag;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub base_path: Arc<String>,
}

pub fn create_app(state: AppState) -> Router {
    let base_path = state.base_path.clone();

    let app_routes = Router::new()
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/logout", post(handlers::auth::logout))
        .route("/api/profile", put(handlers::auth::update_profile))
        .route("/api/password", put(handlers::auth::change_password))
        .route(
            "/api/boards",
            get(handlers::api::list_boards).post(handlers::api::create_board),
        )
        .route(
            "/api/boards/{id}",
            get(handlers::api::get_board)
                .put(handlers::api::update_board)
                .delete(handlers::api::delete_board),
        )
        .route(
            "/api/boards/{id}/lists",
            get(handlers::api::list_lists).post(handlers::api::create_list),
        )
        .route(
            "/api/lists/{id}",
            put(handlers::api::update_list).delete(handlers::api::delete_list),
        )
        .route(
            "/api/lists/{id}/tasks",
            get(handlers::api::list_tasks).post(handlers::api::create_task),
        )
        .route(
            "/api/tasks/{id}",
            get(handlers::api::get_task)
                .put(handlers::api::update_task)
                .delete(handlers::api::delete_task),
        )
        .route(
            "/api/tasks/{id}/position",
            put(handlers::api::update_task_position),
        )
        .layer(
            tower::ServiceBuilder::new()
                .layer(tower_http::trace::TraceLayer::new_for_http())
                .layer(tower_http::compression::CompressionLayer::new()),
        )
        .with_state(state);

    tracing::info!("base_path: {base_path:?}");

    if base_path.is_empty() {
        app_routes
    } else {
        Router::new().nest(&*base_path, app_routes)
    }
}
