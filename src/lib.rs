#![warn(missing_docs)]
//! Core library entry points for the pagewatch change tracker.

pub mod config;
pub mod diff;
pub mod fetch;
pub mod lock;
pub mod normalizer;
pub mod runner;
pub mod store;
pub mod target;

pub use config::{load_targets, ConfigError};
pub use diff::{diff_lines, render_unified, DiffLine, DiffTag};
pub use fetch::{FetchError, Fetcher, PageSource, DEFAULT_USER_AGENT};
pub use lock::{LockError, RunLock};
pub use normalizer::{canonicalize, fingerprint, CanonicalPage, NormalizationError};
pub use runner::{run, RunOptions, RunSummary, TargetOutcome};
pub use store::{SnapshotRef, SnapshotStore, StoreError};
pub use target::Target;
