//! The project store following sign-in and sign-out through [`AuthService`].

mod common;

use std::sync::Arc;

use agrireg_core::auth::{LoginCredentials, RegisterCredentials, DEFAULT_MIN_PASSWORD_LENGTH};
use agrireg_core::dashboard::DashboardStats;
use agrireg_sync::{AuthService, MemoryRemote, ProjectStore, SyncConfig, SyncPhase};

use common::*;

fn register(email: &str, name: &str) -> RegisterCredentials {
    RegisterCredentials {
        email: email.to_string(),
        password: "secret1".to_string(),
        name: name.to_string(),
        role: None,
    }
}

#[tokio::test]
async fn store_follows_the_signed_in_user() {
    let remote = Arc::new(MemoryRemote::new());
    let auth = AuthService::new(DEFAULT_MIN_PASSWORD_LENGTH);
    let store = ProjectStore::spawn(remote.clone(), auth.observe(), &SyncConfig::default());
    settle().await;
    assert_eq!(store.state().phase, SyncPhase::Uninitialized);

    let ana = auth.register(register("ana@example.com", "Ana")).await.unwrap();
    wait_for(&store, |s| {
        s.owner.as_deref() == Some(ana.uid.as_str()) && s.phase == SyncPhase::Ready
    })
    .await;
    store.create(new_project("Fazenda Ana")).await.unwrap();
    let state = wait_for(&store, |s| s.projects.len() == 1).await;
    assert_eq!(state.projects[0].owner_user_id, ana.uid);

    let bruno = auth.register(register("bruno@example.com", "Bruno")).await.unwrap();
    let state = wait_for(&store, |s| {
        s.owner.as_deref() == Some(bruno.uid.as_str()) && s.phase == SyncPhase::Ready
    })
    .await;
    assert!(state.projects.is_empty());

    auth.logout();
    wait_for(&store, |s| s.phase == SyncPhase::Uninitialized).await;

    auth.login(LoginCredentials {
        email: "ana@example.com".to_string(),
        password: "secret1".to_string(),
    })
    .await
    .unwrap();
    let state = wait_for(&store, |s| s.projects.len() == 1).await;
    let stats = DashboardStats::from_projects(&state.projects);
    assert_eq!(stats.total, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(remote.document_count(COLLECTION).await, 1);
}
