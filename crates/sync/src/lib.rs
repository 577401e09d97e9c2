//! Real-time synchronization of a user's project records.
//!
//! - [`RemoteStore`] — contract for the hosted document store, with
//!   [`MemoryRemote`] as an in-process implementation.
//! - [`codec`] — decoding remote documents into [`Project`](agrireg_core::project::Project)
//!   records and encoding write payloads.
//! - [`ProjectStore`] — the local, reactive project list kept in step with
//!   the remote collection for the signed-in user.
//! - [`AuthService`] — user directory and the identity the store follows.

pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod memory;
pub mod remote;
pub mod store;

pub use auth::{AuthError, AuthService};
pub use config::SyncConfig;
pub use error::SyncError;
pub use memory::MemoryRemote;
pub use remote::{RemoteError, RemoteStore};
pub use store::{ProjectStore, StoreState, SyncPhase};
