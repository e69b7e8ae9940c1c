use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{error::Result, services::historique::HistoriqueEntry, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/project/:id", get(get_project_historique))
        .route("/task/:id", get(get_task_historique))
}

async fn get_project_historique(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<HistoriqueEntry>>> {
    Ok(Json(state.historique.find_all_by_project(id).await?))
}

async fn get_task_historique(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<HistoriqueEntry>>> {
    Ok(Json(state.historique.find_all_by_task(id).await?))
}
