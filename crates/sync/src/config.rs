use agrireg_core::auth::DEFAULT_MIN_PASSWORD_LENGTH;

/// Default remote collection holding project documents.
pub const DEFAULT_PROJECTS_COLLECTION: &str = "projects";

/// Synchronization and auth settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote collection holding project documents.
    pub projects_collection: String,
    /// Minimum password length accepted at registration.
    pub min_password_length: usize,
}

impl SyncConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default    |
    /// |-----------------------|------------|
    /// | `PROJECTS_COLLECTION` | `projects` |
    /// | `MIN_PASSWORD_LENGTH` | `6`        |
    ///
    /// Unparseable numbers fall back to the default.
    pub fn from_env() -> Self {
        let projects_collection = std::env::var("PROJECTS_COLLECTION")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_PROJECTS_COLLECTION.into());

        let min_password_length = std::env::var("MIN_PASSWORD_LENGTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH);

        Self {
            projects_collection,
            min_password_length,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            projects_collection: DEFAULT_PROJECTS_COLLECTION.into(),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}
