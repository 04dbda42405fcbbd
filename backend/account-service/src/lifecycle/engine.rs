use crate::config::TokenSettings;
use crate::db::UserStore;
use crate::error::{LifecycleError, Result};
use crate::lifecycle::flow::{self, FlowProfile};
use crate::models::user::RegisterRequest;
use crate::models::{AccountState, NewUser, User, UserPatch};
use crate::security;
use crate::services::{Notifier, TaskQueue};
use crate::token::{Decoded, TokenCache, TokenClaims, TokenClass, TokenCodec, TokenIssuer};
use crate::validators;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Task name for the deletion flow's profile cleanup cascade.
const DELETE_PROFILE_TASK: &str = "profiles.delete";

/// A token handed out by login, with its remaining lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Successful login outcome.
#[derive(Debug, Clone, Serialize)]
pub struct LoginGrant {
    pub user: User,
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
}

/// Coordinates every account lifecycle flow.
///
/// All collaborators are injected; the engine holds no global state and no
/// locks, so any number of instances may run concurrently against the same
/// cache and store. Cross-request coordination relies entirely on the
/// conditional updates the store performs.
#[derive(Clone)]
pub struct LifecycleEngine {
    codec: TokenCodec,
    issuer: TokenIssuer,
    cache: Arc<dyn TokenCache>,
    store: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    tasks: Arc<dyn TaskQueue>,
    project_name: String,
    public_base_url: String,
}

impl LifecycleEngine {
    pub fn new(
        settings: Arc<TokenSettings>,
        public_base_url: String,
        cache: Arc<dyn TokenCache>,
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        tasks: Arc<dyn TaskQueue>,
    ) -> Self {
        let codec = TokenCodec::new(settings.clone());
        let issuer = TokenIssuer::new(codec.clone(), cache.clone());

        Self {
            codec,
            issuer,
            cache,
            store,
            notifier,
            tasks,
            project_name: settings.project_name.clone(),
            public_base_url,
        }
    }

    // ========== Registration & login ==========

    /// Register a new account and dispatch the activation email.
    ///
    /// The account is stored inactive; it becomes active through the
    /// activation link or on first successful login.
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        if request.password != request.confirm_password {
            return Err(LifecycleError::Validation(
                "Passwords do not match".to_string(),
            ));
        }

        let username = request.username.to_lowercase();
        if !validators::validate_username(&username) {
            return Err(LifecycleError::Validation(
                "Username may only contain lowercase letters, numbers, @, -, _".to_string(),
            ));
        }
        if !validators::validate_email(&request.email) {
            return Err(LifecycleError::Validation(
                "Invalid email address format".to_string(),
            ));
        }
        if !validators::validate_name(&request.first_name)
            || !validators::validate_name(&request.last_name)
        {
            return Err(LifecycleError::Validation(
                "Names may only contain letters".to_string(),
            ));
        }
        if password_contains_personal_info(&request.password, &request) {
            return Err(LifecycleError::WeakPassword(
                "Password must not contain your username, email or name".to_string(),
            ));
        }

        if self.store.find_by_identifier(&username).await?.is_some()
            || self
                .store
                .find_by_identifier(&request.email)
                .await?
                .is_some()
        {
            return Err(LifecycleError::AlreadyExists);
        }

        let password_hash = security::hash_password(&request.password)?;

        let user = self
            .store
            .create(NewUser {
                username,
                email: request.email,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
            })
            .await?;

        info!(user_id = %user.id, "user registered");

        self.send_flow_link(&FlowProfile::ACTIVATION, &user, None)
            .await?;

        Ok(user)
    }

    /// Authenticate and hand out Access and Refresh tokens.
    ///
    /// Each channel is reused or minted independently of the other. A dormant
    /// account is activated as a side effect of its first successful login.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginGrant> {
        let mut user = self
            .store
            .find_by_identifier(identifier)
            .await?
            .ok_or(LifecycleError::UserNotFound)?;

        if !security::verify_password(password, &user.password_hash)? {
            return Err(LifecycleError::InvalidCredentials);
        }

        if !user.is_active {
            self.store
                .conditional_update(user.id, AccountState::Inactive, UserPatch::Activate)
                .await?;
            user.is_active = true;
        }

        let access_token = self.issuer.issue(TokenClass::Access, user.id, None).await?;
        let refresh_token = self
            .issuer
            .issue(TokenClass::Refresh, user.id, None)
            .await?;

        self.store.record_login(user.id).await?;
        user.last_login = Some(Utc::now());

        info!(user_id = %user.id, "user logged in");

        Ok(LoginGrant {
            user,
            access_token: IssuedToken {
                token: access_token,
                expires_in: self.codec.ttl(TokenClass::Access).num_seconds(),
            },
            refresh_token: IssuedToken {
                token: refresh_token,
                expires_in: self.codec.ttl(TokenClass::Refresh).num_seconds(),
            },
        })
    }

    /// Resolve a bearer Access token to its user.
    pub async fn authenticate(&self, access_token: &str) -> Result<User> {
        let claims = match self.codec.decode(TokenClass::Access, access_token) {
            Decoded::Valid(claims) => claims,
            Decoded::Invalid => return Err(LifecycleError::InvalidToken),
        };

        self.store
            .find_by_subject(claims.sub)
            .await?
            .ok_or(LifecycleError::UserNotFound)
    }

    // ========== Initiate side ==========

    /// Resend the activation link for a not-yet-active account.
    pub async fn initiate_activation(&self, identifier: &str) -> Result<()> {
        let user = self
            .store
            .find_by_identifier(identifier)
            .await?
            .ok_or(LifecycleError::UserNotFound)?;

        self.send_flow_link(&FlowProfile::ACTIVATION, &user, None)
            .await
    }

    pub async fn initiate_deactivation(&self, user: &User) -> Result<()> {
        self.send_flow_link(&FlowProfile::DEACTIVATION, user, None)
            .await
    }

    pub async fn initiate_deletion(&self, user: &User) -> Result<()> {
        self.send_flow_link(&FlowProfile::DELETION, user, None).await
    }

    /// Anonymous password reset: the caller supplies a username or email.
    pub async fn initiate_password_reset(&self, identifier: &str) -> Result<()> {
        let user = self
            .store
            .find_by_identifier(identifier)
            .await?
            .ok_or(LifecycleError::UserNotFound)?;

        self.send_flow_link(&FlowProfile::RESET_PASSWORD, &user, None)
            .await
    }

    pub async fn initiate_username_update(&self, user: &User) -> Result<()> {
        self.send_flow_link(&FlowProfile::UPDATE_USERNAME, user, None)
            .await
    }

    /// Start an email change. The pending address travels inside the token's
    /// `new_email` claim; nothing else records it.
    pub async fn initiate_email_update(&self, user: &User, new_email: &str) -> Result<()> {
        if !validators::validate_email(new_email) {
            return Err(LifecycleError::Validation(
                "Invalid email address format".to_string(),
            ));
        }
        if self.store.find_by_identifier(new_email).await?.is_some() {
            return Err(LifecycleError::AlreadyExists);
        }

        self.send_flow_link(&FlowProfile::UPDATE_EMAIL, user, Some(new_email))
            .await
    }

    // ========== Confirm side ==========

    /// Activate the account named by the token.
    pub async fn confirm_activation(&self, token: &str) -> Result<User> {
        let profile = &FlowProfile::ACTIVATION;
        let claims = self.verify_confirm_token(profile.class, token).await?;

        let mut user = self.load_user(claims.sub).await?;

        let applied = self
            .store
            .conditional_update(claims.sub, profile.expected, UserPatch::Activate)
            .await?;
        if !applied {
            return Err(LifecycleError::AlreadyInTargetState);
        }

        self.cache.delete(profile.class, claims.sub).await?;
        user.is_active = true;

        info!(user_id = %user.id, "account activated");
        self.notify_done(&user.email, profile, &user.first_name).await;

        Ok(user)
    }

    /// Deactivate the account named by the token.
    pub async fn confirm_deactivation(&self, token: &str) -> Result<User> {
        let profile = &FlowProfile::DEACTIVATION;
        let claims = self.verify_confirm_token(profile.class, token).await?;

        let mut user = self.load_user(claims.sub).await?;

        let applied = self
            .store
            .conditional_update(claims.sub, profile.expected, UserPatch::Deactivate)
            .await?;
        if !applied {
            return Err(LifecycleError::AlreadyInTargetState);
        }

        self.cache.delete(profile.class, claims.sub).await?;
        user.is_active = false;

        info!(user_id = %user.id, "account deactivated");
        self.notify_done(&user.email, profile, &user.first_name).await;

        Ok(user)
    }

    /// Delete the account named by the token and cascade the profile cleanup
    /// through the task queue.
    pub async fn confirm_deletion(&self, token: &str) -> Result<()> {
        let profile = &FlowProfile::DELETION;
        let claims = self.verify_confirm_token(profile.class, token).await?;

        let user = self.load_user(claims.sub).await?;

        let removed = self
            .store
            .delete(claims.sub, profile.expected)
            .await?;
        if !removed {
            return Err(LifecycleError::AlreadyInTargetState);
        }

        self.tasks
            .enqueue(DELETE_PROFILE_TASK, json!({ "user_id": claims.sub }))
            .await?;

        self.cache.delete(profile.class, claims.sub).await?;

        info!(user_id = %claims.sub, "account deleted");
        self.notify_done(&user.email, profile, &user.first_name).await;

        Ok(())
    }

    /// Replace the password of the account named by the token.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        if password != confirm_password {
            return Err(LifecycleError::Validation(
                "Passwords do not match".to_string(),
            ));
        }

        let profile = &FlowProfile::RESET_PASSWORD;
        let claims = self.verify_confirm_token(profile.class, token).await?;

        let user = self.load_user(claims.sub).await?;

        let password_hash = security::hash_password(password)?;

        let applied = self
            .store
            .conditional_update(
                claims.sub,
                profile.expected,
                UserPatch::SetPasswordHash(password_hash),
            )
            .await?;
        if !applied {
            return Err(LifecycleError::AlreadyInTargetState);
        }

        self.cache.delete(profile.class, claims.sub).await?;

        info!(user_id = %user.id, "password reset");
        self.notify_done(&user.email, profile, &user.first_name).await;

        Ok(())
    }

    /// Change the username of the account named by the token. The new value
    /// comes from the confirm request body, independent of the token.
    pub async fn confirm_username_update(&self, token: &str, new_username: &str) -> Result<()> {
        let profile = &FlowProfile::UPDATE_USERNAME;
        let claims = self.verify_confirm_token(profile.class, token).await?;

        let username = new_username.to_lowercase();
        if !validators::validate_username(&username) {
            return Err(LifecycleError::Validation(
                "Username may only contain lowercase letters, numbers, @, -, _".to_string(),
            ));
        }

        let user = self.load_user(claims.sub).await?;

        if let Some(existing) = self.store.find_by_identifier(&username).await? {
            if existing.id != claims.sub {
                return Err(LifecycleError::AlreadyExists);
            }
        }

        let applied = self
            .store
            .conditional_update(
                claims.sub,
                profile.expected,
                UserPatch::SetUsername(username),
            )
            .await?;
        if !applied {
            return Err(LifecycleError::AlreadyInTargetState);
        }

        self.cache.delete(profile.class, claims.sub).await?;

        info!(user_id = %user.id, "username updated");
        self.notify_done(&user.email, profile, &user.first_name).await;

        Ok(())
    }

    /// Change the email address of the account named by the token.
    ///
    /// The applied address is the one bound into the token's `new_email`
    /// claim when the flow was initiated; the confirm request carries no
    /// address of its own.
    pub async fn confirm_email_update(&self, token: &str) -> Result<()> {
        let profile = &FlowProfile::UPDATE_EMAIL;
        let claims = self.verify_confirm_token(profile.class, token).await?;

        let new_email = claims
            .new_email
            .clone()
            .ok_or(LifecycleError::InvalidToken)?;

        let user = self.load_user(claims.sub).await?;

        if let Some(existing) = self.store.find_by_identifier(&new_email).await? {
            if existing.id != claims.sub {
                return Err(LifecycleError::AlreadyExists);
            }
        }

        let applied = self
            .store
            .conditional_update(
                claims.sub,
                profile.expected,
                UserPatch::SetEmail(new_email.clone()),
            )
            .await?;
        if !applied {
            return Err(LifecycleError::AlreadyInTargetState);
        }

        self.cache.delete(profile.class, claims.sub).await?;

        info!(user_id = %user.id, "email updated");
        // The notice goes to the address that just became current.
        self.notify_done(&new_email, profile, &user.first_name).await;

        Ok(())
    }

    // ========== Shared steps ==========

    /// Initiate side, common to all flows: check the precondition, obtain a
    /// token that is valid right now, email the confirmation link.
    async fn send_flow_link(
        &self,
        profile: &FlowProfile,
        user: &User,
        extra: Option<&str>,
    ) -> Result<()> {
        if user.is_active != profile.expected.is_active() {
            return Err(LifecycleError::AlreadyInTargetState);
        }

        let token = self.issuer.issue(profile.class, user.id, extra).await?;
        let link = format!(
            "{}{}?token={}",
            self.public_base_url, profile.confirm_path, token
        );
        let expires_at = Utc::now() + self.codec.ttl(profile.class);
        let subject = format!(
            "{} Your {} {}",
            profile.verb, self.project_name, profile.noun
        );
        let (html, text) = flow::link_email(&user.first_name, profile.action, &link, expires_at);

        self.notifier.send(&user.email, &subject, &html, &text).await
    }

    /// A token is usable for a confirm operation only if it verifies under
    /// the class's secret AND is byte-identical to the cached entry. The
    /// second check makes the cache a revocation list: deleting the entry
    /// kills the token before its cryptographic expiry.
    async fn verify_confirm_token(&self, class: TokenClass, token: &str) -> Result<TokenClaims> {
        let claims = match self.codec.decode(class, token) {
            Decoded::Valid(claims) => claims,
            Decoded::Invalid => return Err(LifecycleError::InvalidToken),
        };

        match self.cache.get(class, claims.sub).await? {
            Some(cached) if cached == token => Ok(claims),
            _ => Err(LifecycleError::InvalidToken),
        }
    }

    async fn load_user(&self, subject: Uuid) -> Result<User> {
        self.store
            .find_by_subject(subject)
            .await?
            .ok_or(LifecycleError::UserNotFound)
    }

    /// Best-effort confirmation notice. The state transition it follows is
    /// never rolled back when delivery fails.
    async fn notify_done(&self, recipient: &str, profile: &FlowProfile, first_name: &str) {
        let (html, text) = flow::notice_email(first_name, profile.done_notice);
        if let Err(err) = self
            .notifier
            .send(recipient, profile.done_subject, &html, &text)
            .await
        {
            warn!(error = %err, subject = profile.done_subject, "failed to send confirmation email");
        }
    }
}

fn password_contains_personal_info(password: &str, request: &RegisterRequest) -> bool {
    let needle = password.to_lowercase();
    let email_local = request.email.split('@').next().unwrap_or_default();

    [
        request.username.as_str(),
        email_local,
        request.first_name.as_str(),
        request.last_name.as_str(),
    ]
    .iter()
    .any(|part| !part.is_empty() && needle.contains(&part.to_lowercase()))
}
