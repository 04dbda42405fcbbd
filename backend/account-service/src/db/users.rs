/// User database operations for the account service
use crate::db::UserStore;
use crate::error::Result;
use crate::models::{AccountState, NewUser, User, UserPatch};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, first_name, last_name,
                is_active, is_staff, is_superuser, date_joined, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6,
                FALSE, FALSE, FALSE, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_subject(&self, subject: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(subject)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 OR email = $1")
                .bind(identifier)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    async fn conditional_update(
        &self,
        subject: Uuid,
        expected: AccountState,
        patch: UserPatch,
    ) -> Result<bool> {
        let now = Utc::now();

        let result = match patch {
            UserPatch::Activate => {
                sqlx::query(
                    "UPDATE users SET is_active = TRUE, updated_at = $2 \
                     WHERE id = $1 AND is_active = $3",
                )
                .bind(subject)
                .bind(now)
                .bind(expected.is_active())
                .execute(&self.pool)
                .await?
            }
            UserPatch::Deactivate => {
                sqlx::query(
                    "UPDATE users SET is_active = FALSE, updated_at = $2 \
                     WHERE id = $1 AND is_active = $3",
                )
                .bind(subject)
                .bind(now)
                .bind(expected.is_active())
                .execute(&self.pool)
                .await?
            }
            UserPatch::SetPasswordHash(hash) => {
                sqlx::query(
                    "UPDATE users SET password_hash = $2, updated_at = $3 \
                     WHERE id = $1 AND is_active = $4",
                )
                .bind(subject)
                .bind(hash)
                .bind(now)
                .bind(expected.is_active())
                .execute(&self.pool)
                .await?
            }
            UserPatch::SetUsername(username) => {
                sqlx::query(
                    "UPDATE users SET username = $2, updated_at = $3 \
                     WHERE id = $1 AND is_active = $4",
                )
                .bind(subject)
                .bind(username)
                .bind(now)
                .bind(expected.is_active())
                .execute(&self.pool)
                .await?
            }
            UserPatch::SetEmail(email) => {
                sqlx::query(
                    "UPDATE users SET email = $2, updated_at = $3 \
                     WHERE id = $1 AND is_active = $4",
                )
                .bind(subject)
                .bind(email)
                .bind(now)
                .bind(expected.is_active())
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, subject: Uuid, expected: AccountState) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND is_active = $2")
            .bind(subject)
            .bind(expected.is_active())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_login(&self, subject: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(subject)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
