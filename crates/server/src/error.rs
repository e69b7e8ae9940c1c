use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, AppError>;

/// Errors raised by the service layer, translated exactly once into an HTTP
/// status and an `{"error": ...}` body when a handler returns them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad input, missing entity or business-rule violation (400).
    #[error("{0}")]
    Validation(String),

    /// Login failure (401). The login endpoint itself swallows this into a
    /// `{success: false}` envelope instead.
    #[error("{0}")]
    Auth(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Database(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erreur interne du serveur".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
