//! Input checks shared by the register and login paths.

use regex::Regex;

use super::AuthError;

pub const EMAIL_MIN_CHARS: usize = 4;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 64;

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

fn check_lengths(email_normalized: &str, password: &str) -> Result<(), AuthError> {
    let email_len = email_normalized.chars().count();
    if !(EMAIL_MIN_CHARS..=EMAIL_MAX_CHARS).contains(&email_len) {
        return Err(AuthError::Validation(format!(
            "Email must be between {EMAIL_MIN_CHARS} and {EMAIL_MAX_CHARS} characters"
        )));
    }

    let password_len = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&password_len) {
        return Err(AuthError::Validation(format!(
            "Password must be between {PASSWORD_MIN_CHARS} and {PASSWORD_MAX_CHARS} characters"
        )));
    }

    Ok(())
}

/// Validate registration input and return the normalized email.
///
/// # Errors
/// Returns [`AuthError::Validation`] when a length bound or the email shape is violated.
pub fn registration(email: &str, password: &str) -> Result<String, AuthError> {
    let email = normalize_email(email);
    check_lengths(&email, password)?;
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }
    Ok(email)
}

/// Login only enforces the length bounds; anything else surfaces as invalid credentials.
///
/// # Errors
/// Returns [`AuthError::Validation`] when a length bound is violated.
pub fn login(email: &str, password: &str) -> Result<String, AuthError> {
    let email = normalize_email(email);
    check_lengths(&email, password)?;
    Ok(email)
}
