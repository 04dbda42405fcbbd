//! Thin HTTP surface over the lifecycle engine
//!
//! Handlers only adapt engine outcomes to responses; validation, rate
//! limiting and the rest of the edge concerns live in front of this service.

pub mod users;

use crate::error::LifecycleError;
use crate::lifecycle::LifecycleEngine;
use crate::models::User;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LifecycleEngine>,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/activate", get(users::activate_confirm))
        .route("/api/users/resend_activation", post(users::resend_activation))
        .route("/api/users/login", post(users::login))
        .route("/api/users/deactivate", post(users::deactivate))
        .route("/api/users/deactivate_confirm", get(users::deactivate_confirm))
        .route("/api/users/delete", post(users::delete))
        .route("/api/users/delete_confirm", get(users::delete_confirm))
        .route("/api/users/reset_password", post(users::reset_password))
        .route(
            "/api/users/reset_password_confirm",
            post(users::reset_password_confirm),
        )
        .route("/api/users/update_username", post(users::update_username))
        .route(
            "/api/users/update_username_confirm",
            post(users::update_username_confirm),
        )
        .route("/api/users/update_email", post(users::update_email))
        .route(
            "/api/users/update_email_confirm",
            get(users::update_email_confirm),
        )
        .with_state(state)
}

/// Extractor for the authenticated user of a bearer Access token.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = LifecycleError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(LifecycleError::InvalidToken)?;

        let user = state.engine.authenticate(bearer).await?;
        Ok(CurrentUser(user))
    }
}
