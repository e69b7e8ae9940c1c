pub mod historique;
pub mod project_users;
pub mod projects;
pub mod task_assigns;
pub mod tasks;
pub mod users;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/user", users::router())
        .nest("/project/user", project_users::router())
        .nest("/project", projects::router())
        .nest("/task", tasks::router())
        .nest("/assign", task_assigns::router())
        .nest("/historique", historique::router())
}
