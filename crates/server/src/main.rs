use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod routes;
mod services;

use services::{
    historique::HistoriqueService,
    mailer::{DynMailer, LogMailer},
    project::ProjectService,
    project_user::ProjectUserService,
    task::TaskService,
    task_assign::TaskAssignService,
    user::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub projects: ProjectService,
    pub tasks: TaskService,
    pub memberships: ProjectUserService,
    pub assignments: TaskAssignService,
    pub historique: HistoriqueService,
}

impl AppState {
    pub fn new(pool: sqlx::SqlitePool, mailer: DynMailer) -> Self {
        Self {
            users: UserService::new(pool.clone()),
            projects: ProjectService::new(pool.clone()),
            tasks: TaskService::new(pool.clone()),
            memberships: ProjectUserService::new(pool.clone()),
            assignments: TaskAssignService::new(pool.clone(), mailer),
            historique: HistoriqueService::new(pool),
        }
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(routes::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chantier_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env();

    // Initialize database
    let db = db::Database::connect(&config.database_url).await?;
    db.run_migrations().await?;

    let mailer = Arc::new(LogMailer::new(config.mail_from.clone()));
    let state = AppState::new(db.pool, mailer);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

/// Full application over an in-memory database, for router-level tests.
#[cfg(test)]
pub async fn test_app() -> Router {
    let pool = db::test_pool().await;
    let mailer = Arc::new(LogMailer::new("noreply@test.local".to_string()));
    app(AppState::new(pool, mailer))
}
