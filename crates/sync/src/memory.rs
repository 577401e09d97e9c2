//! In-process implementation of [`RemoteStore`].
//!
//! Behaves like the hosted backend as far as the synchronization layer can
//! observe: ids are assigned by the store, server timestamp placeholders are
//! resolved against the store's clock, documents are delivered in id order,
//! and every live subscription receives a full snapshot on subscribe and
//! after each change to a document it matches.

use std::collections::{BTreeMap, HashMap};

use agrireg_core::timestamp::BackendTimestamp;
use agrireg_core::types::DocumentId;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::remote::{
    EqualityFilter, FieldValue, Fields, RawDocument, RemoteError, RemoteStore, SnapshotSink,
    Subscription,
};

struct Listener {
    collection: String,
    filter: EqualityFilter,
    sink: SnapshotSink,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<DocumentId, Fields>>,
    listeners: Vec<Listener>,
    write_failure: Option<RemoteError>,
}

impl Inner {
    fn snapshot(&self, collection: &str, filter: &EqualityFilter) -> Vec<RawDocument> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| filter.matches(fields))
                    .map(|(id, fields)| RawDocument {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push a fresh snapshot to every listener the change is visible to:
    /// the document matched its filter before the write, after it, or both.
    fn notify(&mut self, collection: &str, before: Option<&Fields>, after: Option<&Fields>) {
        let mut deliveries = Vec::new();
        for (idx, listener) in self.listeners.iter().enumerate() {
            if listener.collection != collection {
                continue;
            }
            let affected = before.is_some_and(|f| listener.filter.matches(f))
                || after.is_some_and(|f| listener.filter.matches(f));
            if affected {
                deliveries.push((idx, self.snapshot(collection, &listener.filter)));
            }
        }
        for (idx, docs) in deliveries {
            self.listeners[idx].sink.send(Ok(docs));
        }
        self.prune();
    }

    fn prune(&mut self) {
        self.listeners.retain(|l| !l.sink.is_closed());
    }

    fn check_writable(&self) -> Result<(), RemoteError> {
        match &self.write_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Replace server timestamp placeholders with the store clock.
fn resolve_placeholders(mut fields: Fields) -> Fields {
    let now = BackendTimestamp::now();
    for value in fields.values_mut() {
        if *value == FieldValue::ServerTimestamp {
            *value = FieldValue::Timestamp(now);
        }
    }
    fields
}

/// Document store held entirely in memory.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared between the project store and whoever seeds or inspects it.
#[derive(Default)]
pub struct MemoryRemote {
    inner: RwLock<Inner>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a document under a caller-chosen id, bypassing the normal write
    /// path. Lets callers seed documents of any shape.
    pub async fn insert_raw(&self, collection: &str, id: &str, fields: Fields) {
        let fields = resolve_placeholders(fields);
        let mut inner = self.inner.write().await;
        let before = inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields.clone());
        inner.notify(collection, before.as_ref(), Some(&fields));
    }

    /// Read one stored document.
    pub async fn document(&self, collection: &str, id: &str) -> Option<Fields> {
        self.inner
            .read()
            .await
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents stored in `collection`.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.inner
            .read()
            .await
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Number of subscriptions that are still live.
    pub async fn listener_count(&self) -> usize {
        let mut inner = self.inner.write().await;
        inner.prune();
        inner.listeners.len()
    }

    /// Deliver `error` to every live subscription on `collection`.
    pub async fn fail_subscriptions(&self, collection: &str, error: RemoteError) {
        let mut inner = self.inner.write().await;
        for listener in inner.listeners.iter().filter(|l| l.collection == collection) {
            listener.sink.send(Err(error.clone()));
        }
        inner.prune();
    }

    /// Make every subsequent write fail with `error` until cleared with `None`.
    pub async fn set_write_failure(&self, error: Option<RemoteError>) {
        self.inner.write().await.write_failure = error;
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn subscribe(
        &self,
        collection: &str,
        filter: EqualityFilter,
    ) -> Result<Subscription, RemoteError> {
        let (sink, subscription) = Subscription::channel();
        let mut inner = self.inner.write().await;
        sink.send(Ok(inner.snapshot(collection, &filter)));
        inner.listeners.push(Listener {
            collection: collection.to_string(),
            filter,
            sink,
        });
        Ok(subscription)
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, RemoteError> {
        let mut inner = self.inner.write().await;
        inner.check_writable()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let fields = resolve_placeholders(fields);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields.clone());
        inner.notify(collection, None, Some(&fields));
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), RemoteError> {
        let mut inner = self.inner.write().await;
        inner.check_writable()?;
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| RemoteError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        let before = doc.clone();
        doc.extend(resolve_placeholders(fields));
        let after = doc.clone();
        inner.notify(collection, Some(&before), Some(&after));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.write().await;
        inner.check_writable()?;
        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if let Some(before) = removed {
            inner.notify(collection, Some(&before), None);
        }
        Ok(())
    }
}
