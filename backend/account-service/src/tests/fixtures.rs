/// Test fixtures and in-memory fakes
use crate::config::{ClassConfig, TokenSettings};
use crate::db::UserStore;
use crate::error::{LifecycleError, Result};
use crate::lifecycle::LifecycleEngine;
use crate::models::user::RegisterRequest;
use crate::models::{AccountState, NewUser, User, UserPatch};
use crate::services::{Notifier, TaskQueue};
use crate::token::{TokenCache, TokenClaims, TokenClass};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "Str0ng&Secret";
pub const TEST_PROJECT: &str = "corelink-test";

/// Token settings with a distinct secret per class.
pub fn test_token_settings() -> TokenSettings {
    fn class(secret: &str, ttl_secs: u64) -> ClassConfig {
        ClassConfig {
            secret: secret.to_string(),
            ttl_secs,
        }
    }

    TokenSettings {
        project_name: TEST_PROJECT.to_string(),
        activation: class("activation-secret", 1800),
        access: class("access-secret", 3600),
        refresh: class("refresh-secret", 86_400),
        deactivation: class("deactivation-secret", 86_400),
        deletion: class("deletion-secret", 86_400),
        reset_password: class("reset-password-secret", 86_400),
        update_username: class("update-username-secret", 86_400),
        update_email: class("update-email-secret", 86_400),
    }
}

/// Sign a token for `class` whose expiry is already in the past.
pub fn expired_token(settings: &TokenSettings, class: TokenClass, subject: Uuid) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: subject,
        iss: settings.project_name.clone(),
        aud: settings.project_name.clone(),
        iat: (now - Duration::hours(2)).timestamp(),
        exp: (now - Duration::hours(1)).timestamp(),
        new_email: None,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.class(class).secret.as_bytes()),
    )
    .expect("signing a test token should not fail")
}

/// In-memory token cache (TTL is recorded but never enforced; expiry is
/// simulated by seeding already-expired token strings).
#[derive(Default)]
pub struct InMemoryTokenCache {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn get(&self, class: TokenClass, subject: Uuid) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&class.cache_key(subject))
            .cloned())
    }

    async fn put(
        &self,
        class: TokenClass,
        subject: Uuid,
        token: &str,
        _ttl: Duration,
    ) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(class.cache_key(subject), token.to_string());
        Ok(())
    }

    async fn delete(&self, class: TokenClass, subject: Uuid) -> Result<()> {
        self.entries.lock().unwrap().remove(&class.cache_key(subject));
        Ok(())
    }
}

/// In-memory user store mimicking the conditional-update semantics of the
/// Postgres implementation (one lock acquisition per operation keeps the
/// compare-and-swap atomic).
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    /// Test-only backdoor to flip activation state without a token.
    pub fn set_active(&self, subject: Uuid, active: bool) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&subject) {
            user.is_active = active;
        }
    }

    pub fn get(&self, subject: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&subject).cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.lock().unwrap();

        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(LifecycleError::AlreadyExists);
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: false,
            is_staff: false,
            is_superuser: false,
            date_joined: now,
            last_login: None,
            updated_at: now,
        };
        users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_subject(&self, subject: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&subject).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned())
    }

    async fn conditional_update(
        &self,
        subject: Uuid,
        expected: AccountState,
        patch: UserPatch,
    ) -> Result<bool> {
        let mut users = self.users.lock().unwrap();

        match &patch {
            UserPatch::SetUsername(username) => {
                if users
                    .values()
                    .any(|u| u.id != subject && &u.username == username)
                {
                    return Err(LifecycleError::AlreadyExists);
                }
            }
            UserPatch::SetEmail(email) => {
                if users.values().any(|u| u.id != subject && &u.email == email) {
                    return Err(LifecycleError::AlreadyExists);
                }
            }
            _ => {}
        }

        let Some(user) = users.get_mut(&subject) else {
            return Ok(false);
        };
        if user.is_active != expected.is_active() {
            return Ok(false);
        }

        match patch {
            UserPatch::Activate => user.is_active = true,
            UserPatch::Deactivate => user.is_active = false,
            UserPatch::SetPasswordHash(hash) => user.password_hash = hash,
            UserPatch::SetUsername(username) => user.username = username,
            UserPatch::SetEmail(email) => user.email = email,
        }
        user.updated_at = Utc::now();

        Ok(true)
    }

    async fn delete(&self, subject: Uuid, expected: AccountState) -> Result<bool> {
        let mut users = self.users.lock().unwrap();

        match users.get(&subject) {
            Some(user) if user.is_active == expected.is_active() => {
                users.remove(&subject);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_login(&self, subject: Uuid) -> Result<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(&subject) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }
}

/// A mail captured by the recording notifier.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub text: String,
}

/// Notifier that records every send; can be switched to fail on demand.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMail>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        _html_body: &str,
        text_body: &str,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LifecycleError::Notification("smtp unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            text: text_body.to_string(),
        });
        Ok(())
    }
}

/// Task queue that records every enqueue.
#[derive(Default)]
pub struct RecordingTaskQueue {
    tasks: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingTaskQueue {
    pub fn enqueued(&self) -> Vec<(String, serde_json::Value)> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskQueue for RecordingTaskQueue {
    async fn enqueue(&self, task: &str, payload: serde_json::Value) -> Result<()> {
        self.tasks
            .lock()
            .unwrap()
            .push((task.to_string(), payload));
        Ok(())
    }
}

/// Engine wired to in-memory fakes, with handles kept for assertions.
pub struct TestHarness {
    pub engine: LifecycleEngine,
    pub settings: Arc<TokenSettings>,
    pub store: Arc<InMemoryUserStore>,
    pub cache: Arc<InMemoryTokenCache>,
    pub notifier: Arc<RecordingNotifier>,
    pub tasks: Arc<RecordingTaskQueue>,
}

pub fn harness() -> TestHarness {
    let settings = Arc::new(test_token_settings());
    let store = Arc::new(InMemoryUserStore::default());
    let cache = Arc::new(InMemoryTokenCache::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let tasks = Arc::new(RecordingTaskQueue::default());

    let engine = LifecycleEngine::new(
        settings.clone(),
        "http://testserver".to_string(),
        cache.clone(),
        store.clone(),
        notifier.clone(),
        tasks.clone(),
    );

    TestHarness {
        engine,
        settings,
        store,
        cache,
        notifier,
        tasks,
    }
}

impl TestHarness {
    /// Insert a user directly into the store.
    pub async fn seed_user(&self, username: &str, email: &str, active: bool) -> User {
        let user = self
            .store
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: crate::security::hash_password(TEST_PASSWORD)
                    .expect("test password should hash"),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
            })
            .await
            .expect("seeding a user should not fail");

        if active {
            self.store.set_active(user.id, true);
        }
        self.store.get(user.id).expect("seeded user should exist")
    }

    /// The live cached token for `(class, subject)`, if any.
    pub async fn cached_token(&self, class: TokenClass, subject: Uuid) -> Option<String> {
        self.cache
            .get(class, subject)
            .await
            .expect("in-memory cache get cannot fail")
    }
}

/// A well-formed registration request.
pub fn valid_register_request() -> RegisterRequest {
    RegisterRequest {
        username: "john_doe".to_string(),
        email: "john_doe@example.com".to_string(),
        password: TEST_PASSWORD.to_string(),
        confirm_password: TEST_PASSWORD.to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
    }
}
