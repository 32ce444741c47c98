use axum::extract::{Path, Query, State};
use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use crate::db;
use crate::error::AppError;
use crate::middleware::Auth;
use crate::models::{
    Board, BoardQuery, BoardSummary, CreateBoard, CreateList, CreateTask, List, Task, UpdateBoard,
    UpdateList, UpdateTask, UpdateTaskPosition,
};
use crate::AppState;

fn non_empty<'a>(value: &'a str, message: &'static str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::BadRequest(message))
    } else {
        Ok(trimmed)
    }
}

// Boards

pub async fn list_boards(
    auth: Auth,
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<Vec<BoardSummary>>, AppError> {
    let filter = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let boards = db::list_boards(&state.db, auth.user_id, filter)?;
    info!(count = boards.len(), filter = ?filter, "Listed boards");
    Ok(Json(boards))
}

pub async fn get_board(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Board>, AppError> {
    db::get_board(&state.db, auth.user_id, id)?
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn create_board(
    auth: Auth,
    State(state): State<AppState>,
    Json(req): Json<CreateBoard>,
) -> Result<(StatusCode, Json<Board>), AppError> {
    let name = non_empty(&req.name, "Name cannot be empty")?;
    let board = db::create_board(&state.db, auth.user_id, name)?;
    info!(id = board.id, name = %board.name, "Created board");
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn update_board(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBoard>,
) -> Result<Json<Board>, AppError> {
    let name = non_empty(&req.name, "Name cannot be empty")?;
    match db::rename_board(&state.db, auth.user_id, id, name)? {
        Some(board) => {
            info!(id, "Renamed board");
            Ok(Json(board))
        }
        None => Err(AppError::NotFound),
    }
}

pub async fn delete_board(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if db::delete_board(&state.db, auth.user_id, id)? {
        info!(id, "Deleted board");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

// Lists

pub async fn list_lists(
    auth: Auth,
    State(state): State<AppState>,
    Path(board_id): Path<i64>,
) -> Result<Json<Vec<List>>, AppError> {
    let lists = db::list_lists(&state.db, auth.user_id, board_id)?.ok_or(AppError::NotFound)?;
    Ok(Json(lists))
}

pub async fn create_list(
    auth: Auth,
    State(state): State<AppState>,
    Path(board_id): Path<i64>,
    Json(req): Json<CreateList>,
) -> Result<(StatusCode, Json<List>), AppError> {
    let title = non_empty(&req.title, "Title cannot be empty")?;
    let color = non_empty(&req.color, "Color cannot be empty")?;

    let list = db::create_list(&state.db, auth.user_id, board_id, title, color)?
        .ok_or(AppError::NotFound)?;
    info!(id = list.id, board_id, title = %list.title, "Created list");
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn update_list(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateList>,
) -> Result<Json<List>, AppError> {
    let title = req
        .title
        .as_deref()
        .map(|t| non_empty(t, "Title cannot be empty"))
        .transpose()?;
    let color = req
        .color
        .as_deref()
        .map(|c| non_empty(c, "Color cannot be empty"))
        .transpose()?;

    match db::update_list(&state.db, auth.user_id, id, title, color)? {
        Some(list) => {
            info!(id, "Updated list");
            Ok(Json(list))
        }
        None => Err(AppError::NotFound),
    }
}

pub async fn delete_list(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if db::delete_list(&state.db, auth.user_id, id)? {
        info!(id, "Deleted list");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

// Tasks

pub async fn list_tasks(
    auth: Auth,
    State(state): State<AppState>,
    Path(list_id): Path<i64>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = db::list_tasks(&state.db, auth.user_id, list_id)?.ok_or(AppError::NotFound)?;
    Ok(Json(tasks))
}

pub async fn create_task(
    auth: Auth,
    State(state): State<AppState>,
    Path(list_id): Path<i64>,
    Json(req): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let title = non_empty(&req.title, "Title cannot be empty")?;

    let task = db::create_task(&state.db, auth.user_id, list_id, title, &req.description)?
        .ok_or(AppError::NotFound)?;
    info!(id = task.id, list_id, position = task.position, "Created task");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    match db::get_task(&state.db, auth.user_id, id)? {
        Some(task) => Ok(Json(task)),
        None => Err(AppError::NotFound),
    }
}

pub async fn update_task(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTask>,
) -> Result<Json<Task>, AppError> {
    let title = req
        .title
        .as_deref()
        .map(|t| non_empty(t, "Title cannot be empty"))
        .transpose()?;

    match db::update_task(
        &state.db,
        auth.user_id,
        id,
        title,
        req.description.as_deref(),
        req.completed,
    )? {
        Some(task) => {
            info!(id = task.id, completed = task.completed, "Updated task");
            Ok(Json(task))
        }
        None => Err(AppError::NotFound),
    }
}

pub async fn update_task_position(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskPosition>,
) -> Result<Json<Task>, AppError> {
    if req.position < 0 {
        return Err(AppError::BadRequest("Position cannot be negative"));
    }

    match db::update_task_position(&state.db, auth.user_id, id, req.position, req.list_id)? {
        Some(task) => {
            info!(id, position = task.position, list_id = task.list_id, "Moved task");
            Ok(Json(task))
        }
        None => Err(AppError::NotFound),
    }
}

pub async fn delete_task(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if db::delete_task(&state.db, auth.user_id, id)? {
        info!(id, "Deleted task");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
