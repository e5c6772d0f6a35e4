use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    state::AppState,
    tasks::dto::{total_pages, CreateTaskRequest, TaskListQuery, TaskPage},
    tasks::repo::Task,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/:id", get(get_task))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/tasks", post(create_task))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<TaskListQuery>,
) -> Result<Json<TaskPage>, ApiError> {
    q.validate()?;
    let limit = q.limit();
    let page = q.page();

    let total = Task::count(&state.db, user_id, q.status.as_deref(), q.title.as_deref()).await?;
    let items = Task::list(
        &state.db,
        user_id,
        q.status.as_deref(),
        q.title.as_deref(),
        limit,
        q.offset(),
    )
    .await?;

    Ok(Json(TaskPage {
        items,
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    }))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let task = Task::get(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    Ok(Json(task))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Task>), ApiError> {
    payload.validate()?;

    let task = Task::create(
        &state.db,
        user_id,
        payload.title.trim(),
        payload.description.as_deref(),
        payload.status.as_deref().unwrap_or("open"),
    )
    .await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::LOCATION,
        format!("/tasks/{}", task.id).parse().unwrap(),
    );

    info!(task_id = %task.id, %user_id, "task created");
    Ok((StatusCode::CREATED, headers, Json(task)))
}
