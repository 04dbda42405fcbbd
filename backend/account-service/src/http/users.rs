/// User lifecycle endpoint handlers
use crate::error::Result;
use crate::http::{AppState, CurrentUser};
use crate::models::user::{
    LoginRequest, RegisterRequest, ResetPasswordConfirmRequest, ResetPasswordRequest,
    UpdateEmailRequest, UpdateUsernameConfirmRequest,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

/// Confirmation token passed as a query parameter.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

/// Identifier payload for anonymous initiate endpoints.
#[derive(Debug, Deserialize)]
pub struct IdentifierRequest {
    pub identifier: String,
}

fn accepted(detail: &str) -> impl IntoResponse {
    (
        StatusCode::ACCEPTED,
        Json(json!({ "detail": detail })),
    )
}

fn ok(detail: &str) -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "detail": detail })))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let user = state.engine.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn resend_activation(
    State(state): State<AppState>,
    Json(payload): Json<IdentifierRequest>,
) -> Result<impl IntoResponse> {
    state.engine.initiate_activation(&payload.identifier).await?;
    Ok(accepted("Activation email sent successfully"))
}

pub async fn activate_confirm(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse> {
    let user = state.engine.confirm_activation(&query.token).await?;
    Ok((StatusCode::OK, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let grant = state
        .engine
        .login(&payload.identifier, &payload.password)
        .await?;
    Ok((StatusCode::OK, Json(grant)))
}

pub async fn deactivate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    state.engine.initiate_deactivation(&user).await?;
    Ok(accepted("Deactivation email sent successfully"))
}

pub async fn deactivate_confirm(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse> {
    state.engine.confirm_deactivation(&query.token).await?;
    Ok(ok("Account deactivated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    state.engine.initiate_deletion(&user).await?;
    Ok(accepted("Deletion email sent successfully"))
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse> {
    state.engine.confirm_deletion(&query.token).await?;
    Ok(ok("Account deleted successfully"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse> {
    state
        .engine
        .initiate_password_reset(&payload.identifier)
        .await?;
    Ok(accepted("Password reset email sent successfully"))
}

pub async fn reset_password_confirm(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(payload): Json<ResetPasswordConfirmRequest>,
) -> Result<impl IntoResponse> {
    state
        .engine
        .confirm_password_reset(&query.token, &payload.password, &payload.confirm_password)
        .await?;
    Ok(ok("Password reset successfully"))
}

pub async fn update_username(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    state.engine.initiate_username_update(&user).await?;
    Ok(accepted("Username update email sent successfully"))
}

pub async fn update_username_confirm(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(payload): Json<UpdateUsernameConfirmRequest>,
) -> Result<impl IntoResponse> {
    state
        .engine
        .confirm_username_update(&query.token, &payload.username)
        .await?;
    Ok(ok("Username updated successfully"))
}

pub async fn update_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateEmailRequest>,
) -> Result<impl IntoResponse> {
    state
        .engine
        .initiate_email_update(&user, &payload.email)
        .await?;
    Ok(accepted("Email update email sent successfully"))
}

pub async fn update_email_confirm(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse> {
    state.engine.confirm_email_update(&query.token).await?;
    Ok(ok("Email updated successfully"))
}
