//! Contract for the hosted document store.
//!
//! The remote store is the single source of truth for project records. It
//! offers filtered live subscriptions plus create/update/delete on a named
//! collection. [`MemoryRemote`](crate::memory::MemoryRemote) implements the
//! contract in-process.

use std::collections::BTreeMap;

use agrireg_core::timestamp::{to_canonical, BackendTimestamp, RawTimestamp};
use agrireg_core::types::{DocumentId, Timestamp};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Field values and documents
// ---------------------------------------------------------------------------

/// A single value inside a remote document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// The backend's own timestamp type.
    Timestamp(BackendTimestamp),
    /// A native date written by a client.
    DateTime(Timestamp),
    /// Write-time placeholder; the backend replaces it with its own clock
    /// when the write is stored.
    ServerTimestamp,
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Render the value as text without type checking.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null | Self::ServerTimestamp => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Timestamp(ts) => ts.to_date().map(to_canonical).unwrap_or_default(),
            Self::DateTime(date) => to_canonical(*date),
        }
    }

    /// Classify the value for timestamp normalization.
    pub fn as_raw_timestamp(&self) -> RawTimestamp {
        match self {
            Self::Timestamp(ts) => RawTimestamp::Wrapper(*ts),
            Self::Text(s) => RawTimestamp::Text(s.clone()),
            Self::DateTime(date) => RawTimestamp::Native(*date),
            _ => RawTimestamp::Unknown,
        }
    }
}

/// Field bag of a document, keyed by field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// A document as delivered by the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: DocumentId,
    pub fields: Fields,
}

/// Equality predicate on one field, used to scope subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityFilter {
    pub field: String,
    pub value: FieldValue,
}

impl EqualityFilter {
    pub fn new(field: impl Into<String>, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: DocumentId },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// One delivery on a subscription: the full matching document set, or an
/// error from the backend.
pub type SnapshotEvent = Result<Vec<RawDocument>, RemoteError>;

/// Backend half of a subscription.
#[derive(Debug, Clone)]
pub struct SnapshotSink {
    sender: mpsc::UnboundedSender<SnapshotEvent>,
    token: CancellationToken,
}

impl SnapshotSink {
    /// Deliver an event. Returns `false` once the subscription has been
    /// released, in which case the sink should be discarded.
    pub fn send(&self, event: SnapshotEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        self.sender.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.sender.is_closed()
    }
}

/// Consumer half of a live subscription.
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe))
/// releases it: the backend stops delivering and nothing still in flight
/// is observable afterwards.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<SnapshotEvent>,
    token: CancellationToken,
}

impl Subscription {
    /// Create a connected sink/subscription pair.
    pub fn channel() -> (SnapshotSink, Subscription) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        (
            SnapshotSink {
                sender,
                token: token.clone(),
            },
            Subscription { receiver, token },
        )
    }

    /// Wait for the next event. Returns `None` when the backend has closed
    /// the subscription or it has been released.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            event = self.receiver.recv() => event,
        }
    }

    pub fn unsubscribe(self) {}

    /// Token that releases this subscription when cancelled. Lets a handle
    /// that does not own the subscription release it synchronously.
    pub fn release_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
        self.receiver.close();
    }
}

// ---------------------------------------------------------------------------
// RemoteStore
// ---------------------------------------------------------------------------

/// Capabilities the synchronization layer needs from the hosted store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Open a live subscription to every document in `collection` matching
    /// `filter`. The current matching set is delivered first, then a fresh
    /// full set after every change to a matching document.
    async fn subscribe(
        &self,
        collection: &str,
        filter: EqualityFilter,
    ) -> Result<Subscription, RemoteError>;

    /// Create a document and return its store-assigned id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, RemoteError>;

    /// Overwrite the supplied fields of an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), RemoteError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError>;
}
