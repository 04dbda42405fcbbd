//! Signed-token machinery for the account lifecycle
//!
//! - `class`: the closed set of token classes and their cache keys
//! - `codec`: stateless JWT encode/decode per class
//! - `cache`: Redis-backed cache that doubles as the revocation list
//! - `issuer`: reuse-or-mint issuance with at most one live token per
//!   `(class, subject)`

pub mod cache;
pub mod class;
pub mod codec;
pub mod issuer;

pub use cache::{RedisTokenCache, TokenCache};
pub use class::TokenClass;
pub use codec::{Decoded, TokenClaims, TokenCodec};
pub use issuer::TokenIssuer;
