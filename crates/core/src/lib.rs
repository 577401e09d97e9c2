//! Domain logic for the land-regularization project tracker.
//!
//! Everything in this crate is pure: no I/O, no async. The synchronization
//! layer (`agrireg-sync`) and the binary build on these types.

pub mod auth;
pub mod dashboard;
pub mod document;
pub mod error;
pub mod project;
pub mod timestamp;
pub mod types;
pub mod wizard;
