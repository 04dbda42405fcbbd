use crate::config::TokenSettings;
use crate::error::{LifecycleError, Result};
use crate::token::TokenClass;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Claims carried by every lifecycle token.
///
/// `new_email` is the only flow-specific claim: the UpdateEmail flow binds the
/// pending address into the token itself instead of storing it elsewhere,
/// which keeps the pending state from drifting apart from the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_email: Option<String>,
}

/// Typed decode outcome: "invalid token" is a normal branch, not an error.
///
/// Verification failures are indistinguishable on purpose; callers only learn
/// that the token did not verify.
#[derive(Debug, Clone)]
pub enum Decoded {
    Valid(TokenClaims),
    Invalid,
}

impl Decoded {
    pub fn is_valid(&self) -> bool {
        matches!(self, Decoded::Valid(_))
    }
}

/// Stateless encoder/decoder for class-scoped signed tokens.
#[derive(Clone)]
pub struct TokenCodec {
    settings: Arc<TokenSettings>,
}

impl TokenCodec {
    pub fn new(settings: Arc<TokenSettings>) -> Self {
        Self { settings }
    }

    /// Lifetime of tokens of the given class.
    pub fn ttl(&self, class: TokenClass) -> Duration {
        Duration::seconds(self.settings.class(class).ttl_secs as i64)
    }

    /// Sign a fresh token for `(class, subject)`.
    ///
    /// Pure function of its inputs and the wall clock; caching is the
    /// issuer's concern.
    pub fn encode(
        &self,
        class: TokenClass,
        subject: Uuid,
        extra: Option<&str>,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject,
            iss: self.settings.project_name.clone(),
            aud: self.settings.project_name.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl(class)).timestamp(),
            new_email: extra.map(str::to_string),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.settings.class(class).secret.as_bytes()),
        )
        .map_err(|e| LifecycleError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token against the class's secret, issuer, audience and expiry.
    ///
    /// The audience must equal the configured value exactly, and no expiry
    /// leeway is granted.
    pub fn decode(&self, class: TokenClass, token: &str) -> Decoded {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.project_name]);
        validation.set_audience(&[&self.settings.project_name]);
        validation.leeway = 0;

        match decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.settings.class(class).secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => Decoded::Valid(data.claims),
            Err(_) => Decoded::Invalid,
        }
    }
}
