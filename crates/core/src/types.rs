/// Identifiers assigned by the remote document store are opaque strings.
pub type DocumentId = String;

/// Authenticated user identity (the auth backend's `uid`).
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
