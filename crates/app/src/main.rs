//! `agrireg` -- runs the project synchronization stack in-process.
//!
//! Signs a demo account in against the in-memory backend, seeds a project,
//! drafts a document for it, and logs every project store change until
//! Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default              | Description                   |
//! |-----------------------|----------|----------------------|-------------------------------|
//! | `AGRIREG_EMAIL`       | no       | `demo@agrireg.local` | Demo account email            |
//! | `AGRIREG_PASSWORD`    | no       | `demo123`            | Demo account password         |
//! | `AGRIREG_NAME`        | no       | `Demo`               | Demo account display name     |
//! | `PROJECTS_COLLECTION` | no       | `projects`           | Remote collection name        |
//! | `MIN_PASSWORD_LENGTH` | no       | `6`                  | Registration password minimum |

use std::sync::Arc;

use agrireg_core::auth::RegisterCredentials;
use agrireg_core::dashboard::DashboardStats;
use agrireg_core::document::FIELD_CPF;
use agrireg_core::project::{NewProject, ProjectStatus};
use agrireg_core::wizard::DocumentWizard;
use agrireg_sync::{AuthService, MemoryRemote, ProjectStore, StoreState, SyncConfig, SyncPhase};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agrireg=info,agrireg_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SyncConfig::from_env();
    tracing::info!(collection = %config.projects_collection, "Loaded sync configuration");

    let remote = Arc::new(MemoryRemote::new());
    let auth = AuthService::new(config.min_password_length);
    let store = ProjectStore::spawn(remote, auth.observe(), &config);

    let reporter = tokio::spawn(report_changes(store.watch()));

    let user = auth
        .register(RegisterCredentials {
            email: env_or("AGRIREG_EMAIL", "demo@agrireg.local"),
            password: env_or("AGRIREG_PASSWORD", "demo123"),
            name: env_or("AGRIREG_NAME", "Demo"),
            role: None,
        })
        .await?;
    tracing::info!(user_id = %user.uid, email = %user.email, "Demo account signed in");

    let project = store
        .create(NewProject {
            name: "Fazenda São João".into(),
            owner_name: user.name.clone(),
            location: "Ribeirão Preto, SP".into(),
            area: "150".into(),
            status: ProjectStatus::Active,
            description: Some("Rural property awaiting titling".into()),
            coordinates: None,
            soil_type: None,
            vegetation: None,
            water_resources: None,
        })
        .await?;

    let mut wizard = DocumentWizard::new(project, None);
    wizard.select_template("declaracao-limites")?;
    wizard.set_field_value("confrontantes", "Maria Souza; Pedro Lima")?;
    wizard.set_field_value(FIELD_CPF, "123.456.789-00")?;
    let document = wizard.generate()?;
    tracing::info!(document = %document.name, template = %document.template_id, "Document generated");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    auth.logout();
    store.shutdown().await;
    reporter.abort();
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Log the store phase and dashboard counts on every change.
async fn report_changes(mut rx: watch::Receiver<StoreState>) {
    while rx.changed().await.is_ok() {
        let state = StoreState::clone(&rx.borrow_and_update());
        match state.phase {
            SyncPhase::Uninitialized => tracing::info!("No user signed in"),
            SyncPhase::Loading => tracing::info!("Loading projects"),
            SyncPhase::Ready => {
                let stats = DashboardStats::from_projects(&state.projects);
                tracing::info!(
                    total = stats.total,
                    active = stats.active,
                    pending = stats.pending,
                    completed = stats.completed,
                    error = state.last_error.as_deref().unwrap_or("-"),
                    "Projects synchronized",
                );
            }
        }
    }
}
