//! Run coordination: one pass over the configured targets.
//!
//! Targets are processed sequentially and independently; any per-target
//! failure is converted into its outcome and the batch continues. Only the
//! caller-level configuration errors abort a run before it starts.

use crate::diff;
use crate::fetch::PageSource;
use crate::normalizer;
use crate::store::SnapshotStore;
use crate::target::Target;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Per-invocation settings for the coordinator.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// When false the run is skipped entirely. Passed in explicitly by the
    /// caller rather than read from ambient process state.
    pub auto_run_enabled: bool,
    /// Date key assigned to snapshots captured during this run.
    pub capture_date: NaiveDate,
    /// Equal lines kept around changed regions in rendered diffs.
    pub diff_context: usize,
}

impl RunOptions {
    /// Options for a normal run capturing under `capture_date`.
    pub fn new(capture_date: NaiveDate) -> Self {
        Self {
            auto_run_enabled: true,
            capture_date,
            diff_context: 3,
        }
    }
}

/// Result of processing one target.
#[derive(Debug)]
pub enum TargetOutcome {
    /// Fetched content matched the latest snapshot; nothing written.
    Unchanged,
    /// A new snapshot was written, with a diff artifact when a prior
    /// snapshot existed.
    Changed {
        /// Path of the new snapshot.
        snapshot: PathBuf,
        /// Path of the regenerated diff artifact, absent for first captures.
        diff: Option<PathBuf>,
    },
    /// Retrieval or normalization failed; nothing written.
    FetchFailed {
        /// Failure description for the summary.
        reason: String,
    },
    /// Persisting the snapshot (or reading prior state) failed.
    StoreFailed {
        /// Failure description for the summary.
        reason: String,
    },
    /// The snapshot persisted but the diff artifact could not be produced.
    DiffFailed {
        /// Path of the snapshot that was still written.
        snapshot: PathBuf,
        /// Failure description for the summary.
        reason: String,
    },
}

impl TargetOutcome {
    /// Whether this outcome counts against the run's exit status.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. } | Self::StoreFailed { .. } | Self::DiffFailed { .. }
        )
    }
}

/// Accumulated per-target outcome counts for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The run was skipped because auto-run was disabled.
    pub disabled: bool,
    /// Targets whose content matched the stored snapshot.
    pub unchanged: usize,
    /// Targets that produced a new snapshot.
    pub changed: usize,
    /// Inactive targets skipped without processing.
    pub inactive: usize,
    /// Retrieval/normalization failures.
    pub fetch_errors: usize,
    /// Snapshot persistence failures.
    pub store_errors: usize,
    /// Diff generation failures.
    pub diff_errors: usize,
}

impl RunSummary {
    fn disabled_run() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: &TargetOutcome) {
        match outcome {
            TargetOutcome::Unchanged => self.unchanged += 1,
            TargetOutcome::Changed { .. } => self.changed += 1,
            TargetOutcome::FetchFailed { .. } => self.fetch_errors += 1,
            TargetOutcome::StoreFailed { .. } => self.store_errors += 1,
            TargetOutcome::DiffFailed { .. } => self.diff_errors += 1,
        }
    }

    /// True when every processed target succeeded.
    pub fn is_success(&self) -> bool {
        self.fetch_errors == 0 && self.store_errors == 0 && self.diff_errors == 0
    }

    /// Number of targets that were actually processed.
    pub fn processed(&self) -> usize {
        self.unchanged + self.changed + self.fetch_errors + self.store_errors + self.diff_errors
    }
}

/// Processes every active target once, sequentially, and returns the
/// accumulated summary. Individual failures never abort the batch.
pub async fn run<S: PageSource>(
    source: &S,
    store: &SnapshotStore,
    targets: &[Target],
    options: &RunOptions,
) -> RunSummary {
    if !options.auto_run_enabled {
        tracing::info!("auto-run disabled; skipping this invocation");
        return RunSummary::disabled_run();
    }

    tracing::info!(
        targets = targets.len(),
        capture_date = %options.capture_date,
        "run started"
    );

    let mut summary = RunSummary::default();
    for target in targets {
        if !target.active {
            tracing::debug!(page = target.label(), "inactive target skipped");
            summary.inactive += 1;
            continue;
        }
        let outcome = process_target(source, store, target, options).await;
        log_outcome(target, &outcome);
        summary.record(&outcome);
    }

    tracing::info!(
        changed = summary.changed,
        unchanged = summary.unchanged,
        inactive = summary.inactive,
        fetch_errors = summary.fetch_errors,
        store_errors = summary.store_errors,
        diff_errors = summary.diff_errors,
        "run finished"
    );
    summary
}

async fn process_target<S: PageSource>(
    source: &S,
    store: &SnapshotStore,
    target: &Target,
    options: &RunOptions,
) -> TargetOutcome {
    let slug = target.slug();

    let body = match source.fetch_page(&target.url).await {
        Ok(body) => body,
        Err(err) => {
            return TargetOutcome::FetchFailed {
                reason: err.to_string(),
            }
        }
    };
    let page = match normalizer::canonicalize(&body) {
        Ok(page) => page,
        Err(err) => {
            return TargetOutcome::FetchFailed {
                reason: err.to_string(),
            }
        }
    };

    match store.latest(&slug) {
        Ok(Some(previous)) => match store.read(&previous) {
            Ok(content) if normalizer::fingerprint(&content) == page.fingerprint => {
                return TargetOutcome::Unchanged;
            }
            Ok(_) => {}
            Err(err) => {
                return TargetOutcome::StoreFailed {
                    reason: err.to_string(),
                }
            }
        },
        Ok(None) => {}
        Err(err) => {
            return TargetOutcome::StoreFailed {
                reason: err.to_string(),
            }
        }
    }

    let snapshot = match store.write_snapshot(&slug, options.capture_date, &page.text) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            return TargetOutcome::StoreFailed {
                reason: err.to_string(),
            }
        }
    };

    // Diff the two newest captures; a first capture has nothing to compare.
    let snapshots = match store.snapshots(&slug) {
        Ok(snapshots) => snapshots,
        Err(err) => {
            return TargetOutcome::DiffFailed {
                snapshot: snapshot.path,
                reason: err.to_string(),
            }
        }
    };
    if snapshots.len() < 2 {
        return TargetOutcome::Changed {
            snapshot: snapshot.path,
            diff: None,
        };
    }

    let from = &snapshots[snapshots.len() - 2];
    let to = &snapshots[snapshots.len() - 1];
    let old_content = match store.read(from) {
        Ok(content) => content,
        Err(err) => {
            return TargetOutcome::DiffFailed {
                snapshot: snapshot.path,
                reason: err.to_string(),
            }
        }
    };
    let new_content = match store.read(to) {
        Ok(content) => content,
        Err(err) => {
            return TargetOutcome::DiffFailed {
                snapshot: snapshot.path,
                reason: err.to_string(),
            }
        }
    };

    let lines = diff::diff_lines(&old_content, &new_content);
    let rendered = diff::render_unified(
        &from.date.to_string(),
        &to.date.to_string(),
        &lines,
        options.diff_context,
    );
    match store.write_diff(&slug, from.date, to.date, &rendered) {
        Ok(path) => TargetOutcome::Changed {
            snapshot: snapshot.path,
            diff: Some(path),
        },
        Err(err) => TargetOutcome::DiffFailed {
            snapshot: snapshot.path,
            reason: err.to_string(),
        },
    }
}

fn log_outcome(target: &Target, outcome: &TargetOutcome) {
    match outcome {
        TargetOutcome::Unchanged => {
            tracing::info!(page = target.label(), url = %target.url, "no change");
        }
        TargetOutcome::Changed { snapshot, diff } => {
            tracing::info!(
                page = target.label(),
                url = %target.url,
                snapshot = %snapshot.display(),
                diff = ?diff,
                "content changed"
            );
        }
        TargetOutcome::FetchFailed { reason } => {
            tracing::warn!(page = target.label(), url = %target.url, %reason, "fetch failed");
        }
        TargetOutcome::StoreFailed { reason } => {
            tracing::error!(page = target.label(), url = %target.url, %reason, "store failed");
        }
        TargetOutcome::DiffFailed { snapshot, reason } => {
            tracing::warn!(
                page = target.label(),
                url = %target.url,
                snapshot = %snapshot.display(),
                %reason,
                "diff generation failed"
            );
        }
    }
}
