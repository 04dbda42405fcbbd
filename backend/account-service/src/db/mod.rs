//! Persistence layer for the account service
//!
//! The engine consumes the narrow [`UserStore`] trait; `users` provides the
//! Postgres implementation. Preconditions are enforced inside the store as
//! conditional updates, never as separate read-then-write steps.

pub mod users;

use crate::error::Result;
use crate::models::{AccountState, NewUser, User, UserPatch};
use async_trait::async_trait;
use uuid::Uuid;

/// Document store interface the lifecycle engine depends on.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new, inactive account.
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn find_by_subject(&self, subject: Uuid) -> Result<Option<User>>;

    /// Look up by username or email address.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>>;

    /// Apply `patch` only if the account is currently in `expected` state.
    ///
    /// Returns `false` when zero rows matched, i.e. the precondition no
    /// longer holds. This is a single compare-and-swap statement so that two
    /// racing confirmations cannot both observe the old state and both write.
    async fn conditional_update(
        &self,
        subject: Uuid,
        expected: AccountState,
        patch: UserPatch,
    ) -> Result<bool>;

    /// Delete the account document if it is currently in `expected` state.
    async fn delete(&self, subject: Uuid, expected: AccountState) -> Result<bool>;

    /// Stamp a successful login.
    async fn record_login(&self, subject: Uuid) -> Result<()>;
}

pub use users::PgUserStore;
