use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{
    db::models::Project,
    error::Result,
    services::project::{CreateProject, ProjectUpdate, ProjectWithTasks},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project).put(update_project))
        .route("/:id", get(get_project).delete(delete_project))
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectWithTasks>>> {
    Ok(Json(state.projects.find_all().await?))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProjectWithTasks>> {
    Ok(Json(state.projects.find_by_id(id).await?))
}

async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProject>,
) -> Result<impl IntoResponse> {
    let project = state.projects.create(body).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn update_project(
    State(state): State<AppState>,
    Json(body): Json<ProjectUpdate>,
) -> Result<Json<Project>> {
    Ok(Json(state.projects.update(body).await?))
}

async fn delete_project(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    state.projects.delete(id).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::test_app;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_then_fetch_embeds_tasks() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/project")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"nom": "P1", "description": "desc"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let project = body_json(response).await;
        assert_eq!(project["nom"], "P1");

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/project/{}", project["id"]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched["nom"], "P1");
        assert_eq!(fetched["tasks"], json!([]));
    }

    #[tokio::test]
    async fn create_without_nom_is_400() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/project")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"description": "desc"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Le projet doit avoir un nom");
    }
}
