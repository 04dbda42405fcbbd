use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User model - core account entity
///
/// Only the fields the lifecycle reads or writes; profile data lives in a
/// separate document owned by another service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Activation state a conditional update expects to find.
///
/// The store compiles this into the `WHERE` clause of the update so that the
/// precondition check and the mutation are one atomic statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    Active,
    Inactive,
}

impl AccountState {
    pub fn is_active(self) -> bool {
        matches!(self, AccountState::Active)
    }
}

/// Mutation applied by a confirm operation.
#[derive(Debug, Clone)]
pub enum UserPatch {
    Activate,
    Deactivate,
    SetPasswordHash(String),
    SetUsername(String),
    SetEmail(String),
}

/// Fields required to create an account (stored inactive until activation).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Registration request payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Login request payload; `identifier` is a username or email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Password reset initiation payload (anonymous lookup)
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub identifier: String,
}

/// Password reset confirmation payload
#[derive(Debug, Deserialize)]
pub struct ResetPasswordConfirmRequest {
    pub password: String,
    pub confirm_password: String,
}

/// Username change confirmation payload
#[derive(Debug, Deserialize)]
pub struct UpdateUsernameConfirmRequest {
    pub username: String,
}

/// Email change initiation payload
#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}
