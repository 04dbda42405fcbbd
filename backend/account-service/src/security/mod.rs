/// Security primitives for the account service
///
/// - **password**: Argon2id password hashing and verification
pub mod password;

pub use password::{hash_password, verify_password};
