use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::{error::Result, services::task_assign::Assigned, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:task_id/:user_id", post(create_assignment))
        // GET takes a task id, DELETE an assignment id; one path shape.
        .route("/:id", get(get_users_by_task).delete(delete_assignment))
}

async fn create_assignment(
    State(state): State<AppState>,
    Path((task_id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    let assign = state.assignments.create(task_id, user_id).await?;
    Ok((StatusCode::CREATED, Json(assign)))
}

async fn get_users_by_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<Assigned>>> {
    Ok(Json(state.assignments.users_by_task_id(task_id).await?))
}

async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.assignments.delete_by_id(id).await?;
    Ok(StatusCode::OK)
}
