//! User identity types and credential validation.
//!
//! Password hashing and the user directory live in the sync crate; this
//! module only defines the shapes and the rules a registration or login
//! request must satisfy before it reaches the directory.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{from_validation, CoreError};
use crate::types::{Timestamp, UserId};

/// Default minimum password length accepted at registration.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Role assigned at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// The authenticated user as seen by the rest of the application.
///
/// Only `uid` drives project synchronization; the remaining fields are
/// profile data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: Timestamp,
    pub last_login: Option<Timestamp>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterCredentials {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginCredentials {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Validate that a password meets the minimum length.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), CoreError> {
    if password.chars().count() < min_length {
        return Err(CoreError::Validation(format!(
            "Password must be at least {min_length} characters long"
        )));
    }
    Ok(())
}

/// Validate a registration request: every field present, a well-formed
/// email, and a password of at least `min_password_length` characters.
pub fn validate_registration(
    creds: &RegisterCredentials,
    min_password_length: usize,
) -> Result<(), CoreError> {
    creds.validate().map_err(|e| from_validation(&e))?;
    validate_password_strength(&creds.password, min_password_length)
}

/// Validate a login request (both fields present).
pub fn validate_login(creds: &LoginCredentials) -> Result<(), CoreError> {
    creds.validate().map_err(|e| from_validation(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn register(email: &str, password: &str, name: &str) -> RegisterCredentials {
        RegisterCredentials {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            role: None,
        }
    }

    #[test]
    fn valid_registration_passes() {
        let creds = register("ana@example.com", "secret1", "Ana");
        assert!(validate_registration(&creds, DEFAULT_MIN_PASSWORD_LENGTH).is_ok());
    }

    #[test]
    fn missing_fields_are_listed() {
        let creds = register("not-an-email", "", "");
        let err = validate_registration(&creds, DEFAULT_MIN_PASSWORD_LENGTH).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) => {
            assert_eq!(msg, "Invalid fields: email, name, password");
        });
    }

    #[test]
    fn short_password_is_rejected() {
        let creds = register("ana@example.com", "12345", "Ana");
        let err = validate_registration(&creds, DEFAULT_MIN_PASSWORD_LENGTH).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("at least 6"));
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(validate_password_strength("çãõéíú", 6).is_ok());
    }

    #[test]
    fn login_requires_both_fields() {
        let creds = LoginCredentials {
            email: "ana@example.com".into(),
            password: String::new(),
        };
        assert_matches!(validate_login(&creds), Err(CoreError::Validation(_)));
    }
}
