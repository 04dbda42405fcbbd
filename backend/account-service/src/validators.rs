use once_cell::sync::Lazy;
use regex::Regex;

/// Input validation utilities for the account service

// Compile regex patterns once at startup
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9@_-]{3,30}$").expect("hardcoded username regex is invalid")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid")
});

/// Validate username format (3-30 characters, lowercase alphanumeric with @, - and _)
pub fn validate_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

/// Validate email format (RFC 5322 simplified)
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Validate first/last name format (3-30 characters, letters only)
pub fn validate_name(name: &str) -> bool {
    (3..=30).contains(&name.chars().count()) && name.chars().all(|c| c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_username() {
        assert!(validate_username("john_doe"));
        assert!(validate_username("user@site-1"));
    }

    #[test]
    fn test_invalid_username() {
        assert!(!validate_username("John"));
        assert!(!validate_username("ab"));
        assert!(!validate_username("has space"));
        assert!(!validate_username("exclaim!"));
    }

    #[test]
    fn test_valid_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@sub.example.co.uk"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("test@"));
    }

    #[test]
    fn test_valid_name() {
        assert!(validate_name("John"));
        assert!(!validate_name("Jo"));
        assert!(!validate_name("J0hn"));
    }
}
