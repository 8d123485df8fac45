//! # factory-sync
//!
//! Remote file synchronization and batch orchestration.
//!
//! [`remote::sync_file`] runs the probe → delete-if-exists → create-or-update
//! protocol for one rendered file. [`pipeline::run`] drives the whole batch:
//! app discovery, per-application scans, definition parsing, dispatch,
//! rendering, and sync, collecting a per-item [`pipeline::ItemReport`] so the
//! caller can surface aggregate failures.

pub mod error;
pub mod pipeline;
pub mod remote;

pub use error::SyncError;
pub use pipeline::{AppReport, ItemReport, ItemStatus, RunOptions, RunReport};
pub use remote::{sync_file, SyncOutcome};
