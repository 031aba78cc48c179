//! Catalog synchronization.
//!
//! Two operations share one per-item loop:
//! - **Popular sync**: walk the provider's popular listing page by page
//! - **Resync**: refresh every movie already stored, repairing cross-references
//!
//! Only one run may be active at a time; a second request is rejected with
//! [`SyncError::AlreadyRunning`].

mod config;
mod runner;
mod types;

pub use config::SyncConfig;
pub use runner::{merged_fields, SyncJob};
pub use types::{ItemFailure, SyncError, SyncKind, SyncPhase, SyncStatus, SyncSummary};
