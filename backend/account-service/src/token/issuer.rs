use crate::error::Result;
use crate::token::{Decoded, TokenCache, TokenClass, TokenCodec};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Issues tokens that are valid right now.
///
/// A cached token that still verifies is returned unchanged, so repeated
/// "resend" requests never invalidate a link the user may already be holding.
/// Only an absent or no-longer-verifiable entry triggers a fresh mint, which
/// overwrites the cache entry and restarts its TTL.
#[derive(Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    cache: Arc<dyn TokenCache>,
}

impl TokenIssuer {
    pub fn new(codec: TokenCodec, cache: Arc<dyn TokenCache>) -> Self {
        Self { codec, cache }
    }

    /// Return the live token for `(class, subject)`, minting one if needed.
    pub async fn issue(
        &self,
        class: TokenClass,
        subject: Uuid,
        extra: Option<&str>,
    ) -> Result<String> {
        if let Some(cached) = self.cache.get(class, subject).await? {
            if self.codec.decode(class, &cached).is_valid() {
                debug!(class = class.key_prefix(), %subject, "reusing cached token");
                return Ok(cached);
            }
        }

        let token = self.codec.encode(class, subject, extra)?;
        self.cache
            .put(class, subject, &token, self.codec.ttl(class))
            .await?;

        debug!(class = class.key_prefix(), %subject, "minted new token");
        Ok(token)
    }
}
