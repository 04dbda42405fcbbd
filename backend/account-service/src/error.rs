use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Outcome taxonomy for account lifecycle operations.
///
/// `InvalidToken` deliberately collapses every token rejection reason (bad
/// signature, wrong issuer or audience, expired, missing from the cache) into
/// one variant so callers cannot probe which check failed.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Account already in the requested state")]
    AlreadyInTargetState,

    #[error("Username or email already exists")]
    AlreadyExists,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Store(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl LifecycleError {
    /// HTTP status the outcome maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            LifecycleError::InvalidToken | LifecycleError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            LifecycleError::UserNotFound => StatusCode::NOT_FOUND,
            LifecycleError::AlreadyInTargetState | LifecycleError::AlreadyExists => {
                StatusCode::CONFLICT
            }
            LifecycleError::WeakPassword(_) | LifecycleError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            LifecycleError::Store(_)
            | LifecycleError::Cache(_)
            | LifecycleError::Notification(_)
            | LifecycleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LifecycleError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Never leak backend details in responses
        let message = match &self {
            LifecycleError::Store(_)
            | LifecycleError::Cache(_)
            | LifecycleError::Notification(_)
            | LifecycleError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for LifecycleError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return LifecycleError::AlreadyExists;
        }
        tracing::error!("Database error: {}", err);
        LifecycleError::Store(err.to_string())
    }
}

impl From<redis::RedisError> for LifecycleError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("Redis error: {}", err);
        LifecycleError::Cache(err.to_string())
    }
}

/// Postgres unique-constraint violations surface as conflicts, not 500s.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
