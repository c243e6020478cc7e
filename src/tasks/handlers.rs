use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{StatusFilter, TaskIdQuery};
use super::repo_types::{NewTask, Task};
use crate::{
    auth::{dto::Info, extractors::AuthUser},
    error::ApiError,
    state::AppState,
};

// --- public routers ---

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/task/add", post(add_task))
        .route("/task/delete", delete(delete_task))
        .route("/task/done", patch(done_task))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/task/list", get(list_tasks))
        .route("/task/get", get(get_task))
}

fn task_id(query: Result<Query<TaskIdQuery>, QueryRejection>) -> Result<i64, ApiError> {
    query
        .map(|Query(q)| q.id)
        .map_err(|_| ApiError::BadRequest("invalid task id".into()))
}

// --- handlers ---

#[instrument(skip(state, payload))]
pub async fn add_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(new_task) = payload?;
    let task = state.store.tasks().create(user_id, new_task).await?;
    info!(user_id, task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state, query))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<TaskIdQuery>, QueryRejection>,
) -> Result<Json<Info>, ApiError> {
    let id = task_id(query)?;
    state.store.tasks().delete(user_id, id).await?;
    info!(user_id, task_id = id, "task deleted");
    Ok(Json(Info {
        info: "you've successfully deleted a task",
    }))
}

#[instrument(skip(state, query))]
pub async fn done_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<TaskIdQuery>, QueryRejection>,
) -> Result<Json<Info>, ApiError> {
    let id = task_id(query)?;
    state.store.tasks().mark_done(user_id, id).await?;
    info!(user_id, task_id = id, "task done");
    Ok(Json(Info {
        info: "congrats! you've done a task",
    }))
}

/// GET /task/list, optionally `?done=true|false`.
#[instrument(skip(state, filter))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    filter: Result<Query<StatusFilter>, QueryRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let Query(filter) = filter?;
    let tasks = match filter.done {
        Some(done) => state.store.tasks().get_by_status(user_id, done).await?,
        None => state.store.tasks().get_all(user_id).await?,
    };
    Ok(Json(tasks))
}

#[instrument(skip(state, query))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<TaskIdQuery>, QueryRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = task_id(query)?;
    Ok(Json(state.store.tasks().get_by_id(user_id, id).await?))
}
