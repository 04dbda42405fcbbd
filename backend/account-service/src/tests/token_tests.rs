/// Codec and issuer behavior: strict verification, class isolation,
/// idempotent reissue.
use crate::tests::fixtures::*;
use crate::token::{Decoded, TokenCache, TokenClass, TokenCodec, TokenIssuer};
use std::sync::Arc;
use uuid::Uuid;

fn codec() -> TokenCodec {
    TokenCodec::new(Arc::new(test_token_settings()))
}

#[test]
fn test_encode_decode_roundtrip() {
    let codec = codec();
    let subject = Uuid::new_v4();

    let token = codec
        .encode(TokenClass::Activation, subject, None)
        .expect("encoding should succeed");

    match codec.decode(TokenClass::Activation, &token) {
        Decoded::Valid(claims) => {
            assert_eq!(claims.sub, subject);
            assert_eq!(claims.iss, TEST_PROJECT);
            assert_eq!(claims.aud, TEST_PROJECT);
            assert!(claims.exp > claims.iat);
            assert!(claims.new_email.is_none());
        }
        Decoded::Invalid => panic!("freshly encoded token should decode"),
    }
}

#[test]
fn test_extra_claim_roundtrip() {
    let codec = codec();
    let subject = Uuid::new_v4();

    let token = codec
        .encode(TokenClass::UpdateEmail, subject, Some("new@example.com"))
        .expect("encoding should succeed");

    match codec.decode(TokenClass::UpdateEmail, &token) {
        Decoded::Valid(claims) => {
            assert_eq!(claims.new_email.as_deref(), Some("new@example.com"));
        }
        Decoded::Invalid => panic!("token with extra claim should decode"),
    }
}

#[test]
fn test_decode_rejects_other_class() {
    // A deletion token must never satisfy the activation flow: the classes
    // sign with different secrets.
    let codec = codec();
    let subject = Uuid::new_v4();

    let token = codec
        .encode(TokenClass::Deletion, subject, None)
        .expect("encoding should succeed");

    assert!(!codec.decode(TokenClass::Activation, &token).is_valid());
    assert!(codec.decode(TokenClass::Deletion, &token).is_valid());
}

#[test]
fn test_decode_rejects_tampered_token() {
    let codec = codec();
    let token = codec
        .encode(TokenClass::Access, Uuid::new_v4(), None)
        .expect("encoding should succeed");

    let mut tampered = token.clone();
    tampered.pop();

    assert!(!codec.decode(TokenClass::Access, &tampered).is_valid());
}

#[test]
fn test_decode_rejects_expired_token() {
    let settings = test_token_settings();
    let codec = TokenCodec::new(Arc::new(settings.clone()));

    let token = expired_token(&settings, TokenClass::Access, Uuid::new_v4());

    assert!(!codec.decode(TokenClass::Access, &token).is_valid());
}

#[tokio::test]
async fn test_issue_is_idempotent() {
    let cache = Arc::new(InMemoryTokenCache::default());
    let issuer = TokenIssuer::new(codec(), cache.clone());
    let subject = Uuid::new_v4();

    let first = issuer
        .issue(TokenClass::ResetPassword, subject, None)
        .await
        .expect("issuing should succeed");
    let second = issuer
        .issue(TokenClass::ResetPassword, subject, None)
        .await
        .expect("issuing should succeed");

    assert_eq!(first, second);
    assert_eq!(
        cache.get(TokenClass::ResetPassword, subject).await.unwrap(),
        Some(first)
    );
}

#[tokio::test]
async fn test_issue_mints_after_cached_token_expires() {
    let settings = test_token_settings();
    let codec = TokenCodec::new(Arc::new(settings.clone()));
    let cache = Arc::new(InMemoryTokenCache::default());
    let issuer = TokenIssuer::new(codec.clone(), cache.clone());
    let subject = Uuid::new_v4();

    let stale = expired_token(&settings, TokenClass::Access, subject);
    cache
        .put(TokenClass::Access, subject, &stale, codec.ttl(TokenClass::Access))
        .await
        .unwrap();

    let fresh = issuer
        .issue(TokenClass::Access, subject, None)
        .await
        .expect("issuing should succeed");

    assert_ne!(fresh, stale);
    assert!(codec.decode(TokenClass::Access, &fresh).is_valid());
    assert_eq!(
        cache.get(TokenClass::Access, subject).await.unwrap(),
        Some(fresh)
    );
}

#[tokio::test]
async fn test_issue_caches_under_class_key() {
    let cache = Arc::new(InMemoryTokenCache::default());
    let issuer = TokenIssuer::new(codec(), cache.clone());
    let subject = Uuid::new_v4();

    issuer
        .issue(TokenClass::Deactivation, subject, None)
        .await
        .expect("issuing should succeed");

    assert!(cache
        .get(TokenClass::Deactivation, subject)
        .await
        .unwrap()
        .is_some());
    assert!(cache
        .get(TokenClass::Deletion, subject)
        .await
        .unwrap()
        .is_none());
}
