//! User directory and the current-identity provider.
//!
//! [`AuthService`] keeps registered users in memory with Argon2id password
//! hashes and publishes the signed-in user on a `watch` channel. The
//! project store follows that channel; see [`AuthService::observe`].

use std::collections::HashMap;

use agrireg_core::auth::{
    validate_login, validate_registration, AuthUser, LoginCredentials, RegisterCredentials,
};
use agrireg_core::error::CoreError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use tokio::sync::{watch, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("Email already registered: {0}")]
    EmailInUse(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Hash a plaintext password using Argon2id with a random salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a plaintext password against a stored PHC-formatted hash.
fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hashing(e.to_string())),
    }
}

struct UserRecord {
    user: AuthUser,
    password_hash: String,
}

pub struct AuthService {
    /// Keyed by lowercased email.
    users: RwLock<HashMap<String, UserRecord>>,
    current: watch::Sender<Option<AuthUser>>,
    min_password_length: usize,
}

impl AuthService {
    pub fn new(min_password_length: usize) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            users: RwLock::new(HashMap::new()),
            current,
            min_password_length,
        }
    }

    /// Create an account and sign it in.
    pub async fn register(&self, creds: RegisterCredentials) -> Result<AuthUser, AuthError> {
        validate_registration(&creds, self.min_password_length)?;
        let key = creds.email.to_lowercase();

        let mut users = self.users.write().await;
        if users.contains_key(&key) {
            return Err(AuthError::EmailInUse(creds.email));
        }

        let now = Utc::now();
        let user = AuthUser {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email: creds.email,
            name: creds.name,
            role: creds.role.unwrap_or_default(),
            created_at: now,
            last_login: Some(now),
        };
        users.insert(
            key,
            UserRecord {
                user: user.clone(),
                password_hash: hash_password(&creds.password)?,
            },
        );
        drop(users);

        tracing::info!(user_id = %user.uid, "User registered");
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Verify credentials, stamp the login time, and sign the user in.
    pub async fn login(&self, creds: LoginCredentials) -> Result<AuthUser, AuthError> {
        validate_login(&creds)?;

        let mut users = self.users.write().await;
        let record = users
            .get_mut(&creds.email.to_lowercase())
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&creds.password, &record.password_hash)? {
            tracing::warn!(user_id = %record.user.uid, "Rejected login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        record.user.last_login = Some(Utc::now());
        let user = record.user.clone();
        drop(users);

        tracing::info!(user_id = %user.uid, "User signed in");
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    pub fn logout(&self) {
        if let Some(user) = self.current.send_replace(None) {
            tracing::info!(user_id = %user.uid, "User signed out");
        }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    /// Receiver that sees every sign-in and sign-out.
    pub fn observe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }

    /// All registered users, ordered by email.
    pub async fn list_users(&self) -> Vec<AuthUser> {
        let users = self.users.read().await;
        let mut list: Vec<AuthUser> = users.values().map(|r| r.user.clone()).collect();
        list.sort_by(|a, b| a.email.cmp(&b.email));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrireg_core::auth::{UserRole, DEFAULT_MIN_PASSWORD_LENGTH};
    use assert_matches::assert_matches;

    fn service() -> AuthService {
        AuthService::new(DEFAULT_MIN_PASSWORD_LENGTH)
    }

    fn creds(email: &str) -> RegisterCredentials {
        RegisterCredentials {
            email: email.into(),
            password: "secret1".into(),
            name: "Ana".into(),
            role: None,
        }
    }

    fn login(email: &str, password: &str) -> LoginCredentials {
        LoginCredentials {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn register_signs_the_user_in() {
        let auth = service();
        let mut rx = auth.observe();
        let user = auth.register(creds("ana@example.com")).await.unwrap();

        assert_eq!(user.role, UserRole::User);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|u| u.uid.clone()), Some(user.uid));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let auth = service();
        auth.register(creds("ana@example.com")).await.unwrap();
        assert_matches!(
            auth.register(creds("ANA@example.com")).await,
            Err(AuthError::EmailInUse(_))
        );
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected() {
        let auth = service();
        let mut bad = creds("ana@example.com");
        bad.password = "123".into();
        assert_matches!(
            auth.register(bad).await,
            Err(AuthError::Invalid(CoreError::Validation(_)))
        );
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn login_logout_cycle() {
        let auth = service();
        let registered = auth.register(creds("ana@example.com")).await.unwrap();
        auth.logout();
        assert!(auth.current_user().is_none());

        assert_matches!(
            auth.login(login("ana@example.com", "nope")).await,
            Err(AuthError::InvalidCredentials)
        );
        assert_matches!(
            auth.login(login("bob@example.com", "secret1")).await,
            Err(AuthError::InvalidCredentials)
        );

        let user = auth.login(login("ana@example.com", "secret1")).await.unwrap();
        assert_eq!(user.uid, registered.uid);
        assert_eq!(auth.current_user().map(|u| u.uid), Some(registered.uid));
        assert_eq!(auth.list_users().await.len(), 1);
    }
}
