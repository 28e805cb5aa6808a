//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

    match regex {
        Some(regex) if regex.is_match(email) => Ok(()),
        _ => Err("Please provide a valid email address".to_string()),
    }
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
