//! Local project store kept in step with the remote collection.
//!
//! [`ProjectStore::spawn`] starts one background task that follows the
//! identity channel. For a signed-in user it holds exactly one subscription
//! scoped to that user's documents, decodes each snapshot, and replaces the
//! published list wholesale. Consumers read the latest [`StoreState`] or
//! watch it for changes.
//!
//! Mutations go straight to the remote store and never touch the local list:
//! the change becomes visible when the subscription delivers it.

use std::sync::{Arc, Mutex, PoisonError};

use agrireg_core::auth::AuthUser;
use agrireg_core::project::{validate_new_project, NewProject, Project, ProjectUpdate};
use agrireg_core::types::UserId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::codec::{self, field};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::remote::{EqualityFilter, FieldValue, RemoteStore, SnapshotEvent, Subscription};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No identity; the list is empty.
    Uninitialized,
    /// Subscribed for an identity, first snapshot not yet received.
    Loading,
    /// At least one snapshot (or a subscription error) has arrived.
    Ready,
}

/// What consumers see.
#[derive(Debug, Clone)]
pub struct StoreState {
    pub phase: SyncPhase,
    /// Identity the list belongs to.
    pub owner: Option<UserId>,
    pub projects: Arc<Vec<Project>>,
    /// Last subscription error. Cleared by the next good snapshot.
    pub last_error: Option<String>,
}

impl StoreState {
    fn uninitialized() -> Self {
        Self {
            phase: SyncPhase::Uninitialized,
            owner: None,
            projects: Arc::new(Vec::new()),
            last_error: None,
        }
    }

    fn loading(owner: UserId) -> Self {
        Self {
            phase: SyncPhase::Loading,
            owner: Some(owner),
            ..Self::uninitialized()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SyncPhase::Loading
    }
}

// ---------------------------------------------------------------------------
// ProjectStore
// ---------------------------------------------------------------------------

/// Release token of the subscription the sync task currently holds.
#[derive(Clone, Default)]
struct ReleaseSlot(Arc<Mutex<Option<CancellationToken>>>);

impl ReleaseSlot {
    fn set(&self, token: Option<CancellationToken>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn release(&self) {
        if let Some(token) = self.0.lock().unwrap_or_else(PoisonError::into_inner).take() {
            token.cancel();
        }
    }
}

/// Handle to the synchronized project list and its mutation surface.
///
/// Dropping the handle (or calling [`shutdown`](Self::shutdown)) stops the
/// sync task and releases its subscription before returning.
pub struct ProjectStore {
    remote: Arc<dyn RemoteStore>,
    identity: watch::Receiver<Option<AuthUser>>,
    collection: String,
    state: watch::Receiver<StoreState>,
    cancel: CancellationToken,
    release_slot: ReleaseSlot,
    task: Option<JoinHandle<()>>,
}

impl ProjectStore {
    /// Start synchronizing. Must be called from within a Tokio runtime.
    pub fn spawn(
        remote: Arc<dyn RemoteStore>,
        identity: watch::Receiver<Option<AuthUser>>,
        config: &SyncConfig,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(StoreState::uninitialized());
        let cancel = CancellationToken::new();
        let release_slot = ReleaseSlot::default();

        let task = SyncTask {
            remote: Arc::clone(&remote),
            collection: config.projects_collection.clone(),
            identity: identity.clone(),
            state: state_tx,
            cancel: cancel.clone(),
            release_slot: release_slot.clone(),
        };
        let handle = tokio::spawn(task.run());

        Self {
            remote,
            identity,
            collection: config.projects_collection.clone(),
            state: state_rx,
            cancel,
            release_slot,
            task: Some(handle),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn projects(&self) -> Arc<Vec<Project>> {
        Arc::clone(&self.state.borrow().projects)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<StoreState> {
        self.state.clone()
    }

    /// Look up a record in the current list. Never queries the remote store.
    pub fn get_by_id(&self, id: &str) -> Option<Project> {
        self.state.borrow().projects.iter().find(|p| p.id == id).cloned()
    }

    fn current_uid(&self) -> Option<UserId> {
        self.identity.borrow().as_ref().map(|u| u.uid.clone())
    }

    /// Create a project owned by the signed-in user. Blank name, owner,
    /// location or area is rejected before anything is written.
    ///
    /// Returns a provisional record stamped with the client clock; the
    /// authoritative one replaces it when the next snapshot arrives.
    pub async fn create(&self, input: NewProject) -> Result<Project, SyncError> {
        let uid = self.current_uid().ok_or(SyncError::Unauthenticated)?;
        validate_new_project(&input)?;
        let fields = codec::encode_new_project(&input, &uid);
        let id = self.remote.add(&self.collection, fields).await?;
        tracing::debug!(project_id = %id, user_id = %uid, "Project created");
        Ok(codec::optimistic_project(id, uid, input))
    }

    /// Overwrite the supplied fields of a project and refresh `updatedAt`.
    pub async fn update(&self, id: &str, update: ProjectUpdate) -> Result<(), SyncError> {
        self.remote
            .update(&self.collection, id, codec::encode_update(&update))
            .await?;
        tracing::debug!(project_id = %id, "Project updated");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.remote.delete(&self.collection, id).await?;
        tracing::debug!(project_id = %id, "Project deleted");
        Ok(())
    }

    /// Stop the sync task and wait until its subscription is released.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.task.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Project sync task failed");
            }
        }
    }

    fn stop(&self) {
        self.cancel.cancel();
        self.release_slot.release();
    }
}

impl Drop for ProjectStore {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Sync task
// ---------------------------------------------------------------------------

struct SyncTask {
    remote: Arc<dyn RemoteStore>,
    collection: String,
    identity: watch::Receiver<Option<AuthUser>>,
    state: watch::Sender<StoreState>,
    cancel: CancellationToken,
    release_slot: ReleaseSlot,
}

enum Step {
    Shutdown,
    IdentityChanged,
    IdentityClosed,
    Event(Option<SnapshotEvent>),
}

/// Next event on the active subscription; pending forever when there is none.
async fn next_event(active: &mut Option<Subscription>) -> Option<SnapshotEvent> {
    match active {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}

impl SyncTask {
    async fn run(mut self) {
        let mut active: Option<Subscription> = None;
        let mut current_uid = self.identity.borrow_and_update().as_ref().map(|u| u.uid.clone());
        let mut identity_open = true;
        self.switch_identity(current_uid.clone(), &mut active).await;

        loop {
            let step = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Step::Shutdown,
                changed = self.identity.changed(), if identity_open => match changed {
                    Ok(()) => Step::IdentityChanged,
                    Err(_) => Step::IdentityClosed,
                },
                event = next_event(&mut active) => Step::Event(event),
            };

            match step {
                Step::Shutdown => break,
                Step::IdentityChanged => {
                    let uid = self.identity.borrow_and_update().as_ref().map(|u| u.uid.clone());
                    if uid != current_uid {
                        current_uid = uid;
                        self.switch_identity(current_uid.clone(), &mut active).await;
                    }
                }
                Step::IdentityClosed => {
                    tracing::debug!("Identity provider closed, keeping current subscription");
                    identity_open = false;
                }
                Step::Event(Some(Ok(docs))) => {
                    let projects = codec::decode_snapshot(&docs);
                    tracing::debug!(count = projects.len(), "Applied project snapshot");
                    self.state.send_modify(|s| {
                        s.projects = Arc::new(projects);
                        s.phase = SyncPhase::Ready;
                        s.last_error = None;
                    });
                }
                Step::Event(Some(Err(e))) => {
                    tracing::warn!(error = %e, "Project subscription error, keeping last list");
                    self.mark_failed(e.to_string());
                }
                Step::Event(None) => {
                    tracing::warn!("Project subscription closed by the remote store");
                    active = None;
                    self.release_slot.set(None);
                    self.mark_failed("Subscription closed by the remote store".to_string());
                }
            }
        }

        self.release_slot.set(None);
        if active.take().is_some() {
            tracing::debug!("Project subscription released");
        }
    }

    /// Release the current subscription, then open one for `uid` if present.
    async fn switch_identity(&self, uid: Option<UserId>, active: &mut Option<Subscription>) {
        self.release_slot.set(None);
        if let Some(sub) = active.take() {
            sub.unsubscribe();
            tracing::debug!("Project subscription released");
        }

        let Some(uid) = uid else {
            self.state.send_replace(StoreState::uninitialized());
            return;
        };

        self.state.send_replace(StoreState::loading(uid.clone()));
        let filter = EqualityFilter::new(field::USER_ID, FieldValue::text(uid.clone()));
        match self.remote.subscribe(&self.collection, filter).await {
            Ok(sub) => {
                self.release_slot.set(Some(sub.release_token()));
                // The handle may have stopped while the subscribe call was in flight.
                if self.cancel.is_cancelled() {
                    self.release_slot.set(None);
                    sub.unsubscribe();
                    return;
                }
                tracing::info!(user_id = %uid, collection = %self.collection, "Subscribed to projects");
                *active = Some(sub);
            }
            Err(e) => {
                tracing::error!(user_id = %uid, error = %e, "Failed to subscribe to projects");
                self.mark_failed(e.to_string());
            }
        }
    }

    /// Stop loading without touching the list.
    fn mark_failed(&self, message: String) {
        self.state.send_modify(|s| {
            s.phase = SyncPhase::Ready;
            s.last_error = Some(message);
        });
    }
}
