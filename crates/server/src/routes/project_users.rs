use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::{
    db::models::Project,
    error::Result,
    services::project_user::{AddUsersProject, UsersProject},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_users_to_project))
        .route("/list/:project_id", get(get_users_by_project_id))
        // GET takes a user id, DELETE a membership id; one path shape.
        .route("/:id", get(get_projects_by_user_id).delete(delete_membership))
}

async fn get_projects_by_user_id(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Project>>> {
    Ok(Json(state.memberships.projects_by_user_id(user_id).await?))
}

async fn add_users_to_project(
    State(state): State<AppState>,
    Json(body): Json<AddUsersProject>,
) -> Result<impl IntoResponse> {
    let added = state.memberships.add_users_to_project(body).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

async fn get_users_by_project_id(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<UsersProject>> {
    Ok(Json(state.memberships.users_by_project_id(project_id).await?))
}

async fn delete_membership(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.memberships.delete_by_id(id).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::test_app;

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn add_members_then_list_them() {
        let app = test_app().await;

        app.clone()
            .oneshot(post_json(
                "/user",
                json!({"nom": "Alice", "email": "a@x", "mdp": "pass"}),
            ))
            .await
            .unwrap();
        app.clone()
            .oneshot(post_json("/project", json!({"nom": "P", "description": "d"})))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(post_json(
                "/project/user",
                json!({"projectId": 1, "users": [{"userId": 1, "role": "ADMIN"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let added = body_json(response).await;
        assert_eq!(added[0]["role"], "ADMIN");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/project/user/list/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listing = body_json(response).await;
        assert_eq!(listing["projectId"], 1);
        assert_eq!(listing["users"][0]["userId"], 1);
        assert_eq!(listing["users"][0]["role"], "ADMIN");
    }

    #[tokio::test]
    async fn unknown_project_is_400_with_error_body() {
        let app = test_app().await;

        app.clone()
            .oneshot(post_json(
                "/user",
                json!({"nom": "Alice", "email": "a@x", "mdp": "pass"}),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(post_json(
                "/project/user",
                json!({"projectId": 9, "users": [{"userId": 1, "role": "MEMBER"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Project not found with ID: 9");
    }
}
