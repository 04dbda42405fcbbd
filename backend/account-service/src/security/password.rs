/// Password hashing and verification using Argon2id
use crate::error::{LifecycleError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using the Argon2id algorithm.
///
/// Composition requirements are enforced before hashing:
/// - Minimum 8 characters
/// - At least one uppercase letter, one lowercase letter, one digit and one
///   special character
///
/// Returns a PHC-formatted hash string safe for database storage.
pub fn hash_password(password: &str) -> Result<String> {
    validate_password_strength(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| LifecycleError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its stored PHC-formatted hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| LifecycleError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(LifecycleError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(LifecycleError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_alphanumeric());

    if !has_uppercase {
        return Err(LifecycleError::WeakPassword(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !has_lowercase {
        return Err(LifecycleError::WeakPassword(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !has_digit {
        return Err(LifecycleError::WeakPassword(
            "Password must contain at least one digit".to_string(),
        ));
    }

    if !has_special {
        return Err(LifecycleError::WeakPassword(
            "Password must contain at least one special character".to_string(),
        ));
    }

    Ok(())
}
