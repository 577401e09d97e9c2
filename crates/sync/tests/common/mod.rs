#![allow(dead_code)]

use std::time::Duration;

use agrireg_core::auth::{AuthUser, UserRole};
use agrireg_core::project::{NewProject, ProjectStatus};
use agrireg_core::timestamp::BackendTimestamp;
use agrireg_sync::codec::field;
use agrireg_sync::remote::{FieldValue, Fields};
use agrireg_sync::{ProjectStore, StoreState};
use chrono::{TimeZone, Utc};

pub const COLLECTION: &str = "projects";

/// Build a signed-in user with the given uid.
pub fn user(uid: &str) -> AuthUser {
    AuthUser {
        uid: uid.to_string(),
        email: format!("{uid}@example.com"),
        name: uid.to_uppercase(),
        role: UserRole::User,
        created_at: Utc::now(),
        last_login: None,
    }
}

pub fn jan_first() -> BackendTimestamp {
    BackendTimestamp::from_date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

/// A project document as the backend stores it.
pub fn project_doc(owner_uid: &str, name: &str, status: &str) -> Fields {
    Fields::from([
        (field::USER_ID.to_string(), FieldValue::text(owner_uid)),
        (field::NAME.to_string(), FieldValue::text(name)),
        (field::OWNER.to_string(), FieldValue::text("João Silva")),
        (field::LOCATION.to_string(), FieldValue::text("Ribeirão Preto, SP")),
        (field::AREA.to_string(), FieldValue::text("150")),
        (field::STATUS.to_string(), FieldValue::text(status)),
        (field::CREATED_AT.to_string(), FieldValue::Timestamp(jan_first())),
        (field::UPDATED_AT.to_string(), FieldValue::Timestamp(jan_first())),
    ])
}

pub fn new_project(name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        owner_name: "Maria Souza".to_string(),
        location: "Goiás".to_string(),
        area: "80".to_string(),
        status: ProjectStatus::Pending,
        description: None,
        coordinates: None,
        soil_type: None,
        vegetation: None,
        water_resources: None,
    }
}

/// Wait until the store state satisfies `pred`, failing the test after a
/// few seconds.
pub async fn wait_for(store: &ProjectStore, pred: impl FnMut(&StoreState) -> bool) -> StoreState {
    let mut rx = store.watch();
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for store state")
        .expect("store state channel closed");
    StoreState::clone(&state)
}

/// Let the sync task run any work already queued for it.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
