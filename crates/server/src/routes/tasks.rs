use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{db::models::Task, error::Result, services::task::TaskPayload, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task).put(update_task))
        .route("/:id", get(get_task).delete(delete_task))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>> {
    Ok(Json(state.tasks.find_all().await?))
}

async fn get_task(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Task>> {
    Ok(Json(state.tasks.find_by_id(id).await?))
}

async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<TaskPayload>,
) -> Result<impl IntoResponse> {
    let task = state.tasks.create(body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Json(body): Json<TaskPayload>,
) -> Result<Json<Task>> {
    Ok(Json(state.tasks.update(body).await?))
}

async fn delete_task(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    state.tasks.delete_by_id(id).await?;
    Ok(StatusCode::OK)
}
