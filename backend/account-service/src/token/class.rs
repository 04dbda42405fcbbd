use uuid::Uuid;

/// Closed enumeration of token classes.
///
/// Each class signs with its own secret and lives for its own TTL, so a token
/// can only ever satisfy the flow it was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Activation,
    Access,
    Refresh,
    Deactivation,
    Deletion,
    ResetPassword,
    UpdateUsername,
    UpdateEmail,
}

impl TokenClass {
    /// Cache key prefix, e.g. `activation` for `activation_token:{subject}`.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            TokenClass::Activation => "activation",
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
            TokenClass::Deactivation => "deactivation",
            TokenClass::Deletion => "deletion",
            TokenClass::ResetPassword => "reset_password",
            TokenClass::UpdateUsername => "update_username",
            TokenClass::UpdateEmail => "update_email",
        }
    }

    /// Redis key for the live token of `(class, subject)`.
    pub fn cache_key(&self, subject: Uuid) -> String {
        format!("{}_token:{}", self.key_prefix(), subject)
    }
}
