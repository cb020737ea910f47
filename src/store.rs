//! Date-keyed snapshot and diff persistence.
//!
//! The store is the only writer to the on-disk hierarchy. Snapshots live at
//! `<root>/snapshots/<slug>/<YYYY-MM-DD>.html` and diff artifacts at
//! `<root>/diffs/<slug>/diff_<from>_to_<to>.txt`. Retention is left to the
//! operator; nothing here deletes.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const SNAPSHOT_DIR: &str = "snapshots";
const DIFF_DIR: &str = "diffs";
const SNAPSHOT_EXT: &str = "html";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Handle to one stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    /// Capture date, the snapshot's ordering and identity key.
    pub date: NaiveDate,
    /// Location of the canonical content.
    pub path: PathBuf,
}

/// Filesystem failures while reading or writing the hierarchy.
#[derive(Debug)]
pub struct StoreError {
    /// Path the operation touched.
    pub path: PathBuf,
    /// Underlying filesystem error.
    pub source: std::io::Error,
}

impl StoreError {
    fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error at {}: {}", self.path.display(), self.source)
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Sole owner of the snapshot/diff directory layout.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at `root`. Directories are created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of the run-exclusion lock file for this store.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".pagewatch.lock")
    }

    fn snapshot_dir(&self, slug: &str) -> PathBuf {
        self.root.join(SNAPSHOT_DIR).join(slug)
    }

    fn diff_dir(&self, slug: &str) -> PathBuf {
        self.root.join(DIFF_DIR).join(slug)
    }

    /// All snapshots for `slug`, sorted ascending by capture date. A slug
    /// that was never captured yields an empty list. Files that do not parse
    /// as a date key are ignored.
    pub fn snapshots(&self, slug: &str) -> Result<Vec<SnapshotRef>, StoreError> {
        let dir = self.snapshot_dir(slug);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::new(dir, err)),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::new(&dir, err))?;
            let path = entry.path();
            if let Some(date) = parse_snapshot_date(&path) {
                snapshots.push(SnapshotRef { date, path });
            }
        }
        snapshots.sort_by_key(|snapshot| snapshot.date);
        Ok(snapshots)
    }

    /// The chronologically newest snapshot for `slug`, if any.
    pub fn latest(&self, slug: &str) -> Result<Option<SnapshotRef>, StoreError> {
        Ok(self.snapshots(slug)?.pop())
    }

    /// Reads a snapshot's canonical content.
    pub fn read(&self, snapshot: &SnapshotRef) -> Result<String, StoreError> {
        fs::read_to_string(&snapshot.path).map_err(|err| StoreError::new(&snapshot.path, err))
    }

    /// Persists a snapshot under its date key. A same-date write overwrites
    /// the existing file; there is no versioning within one date.
    pub fn write_snapshot(
        &self,
        slug: &str,
        date: NaiveDate,
        content: &str,
    ) -> Result<SnapshotRef, StoreError> {
        let dir = self.snapshot_dir(slug);
        fs::create_dir_all(&dir).map_err(|err| StoreError::new(&dir, err))?;
        let path = dir.join(format!("{}.{SNAPSHOT_EXT}", date.format(DATE_FORMAT)));
        fs::write(&path, content).map_err(|err| StoreError::new(&path, err))?;
        Ok(SnapshotRef { date, path })
    }

    /// Persists a rendered diff artifact comparing `from` to `to`.
    pub fn write_diff(
        &self,
        slug: &str,
        from: NaiveDate,
        to: NaiveDate,
        rendered: &str,
    ) -> Result<PathBuf, StoreError> {
        let dir = self.diff_dir(slug);
        fs::create_dir_all(&dir).map_err(|err| StoreError::new(&dir, err))?;
        let path = dir.join(format!(
            "diff_{}_to_{}.txt",
            from.format(DATE_FORMAT),
            to.format(DATE_FORMAT)
        ));
        fs::write(&path, rendered).map_err(|err| StoreError::new(&path, err))?;
        Ok(path)
    }
}

fn parse_snapshot_date(path: &Path) -> Option<NaiveDate> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXT) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}
