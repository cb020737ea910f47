//! Target-list loading from a JSON configuration file.

use crate::target::Target;
use serde::Deserialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// On-disk shape of one target entry.
#[derive(Debug, Deserialize)]
struct RawTarget {
    url: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

/// Errors that abort the whole run before any target is processed.
#[derive(Debug)]
pub enum ConfigError {
    /// The target file could not be read.
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying filesystem error.
        source: std::io::Error,
    },
    /// The target file is not a valid JSON array of target entries.
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// An entry's URL could not be parsed.
    InvalidUrl {
        /// Offending URL text.
        url: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// The file parsed but contained no targets.
    Empty,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read target list {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid target list {}: {source}", path.display())
            }
            Self::InvalidUrl { url, source } => write!(f, "invalid target url {url}: {source}"),
            Self::Empty => write!(f, "target list is empty"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidUrl { source, .. } => Some(source),
            Self::Empty => None,
        }
    }
}

/// Loads the target list from a JSON array of `{url, name?, active?}` entries.
///
/// Duplicate URLs keep the first record. An unreadable file, malformed JSON,
/// an unparsable URL, or an empty list all fail the load.
pub fn load_targets(path: &Path) -> Result<Vec<Target>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: Vec<RawTarget> = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(raw.len());
    for entry in raw {
        let url = Url::parse(&entry.url).map_err(|source| ConfigError::InvalidUrl {
            url: entry.url.clone(),
            source,
        })?;
        if !seen.insert(url.clone()) {
            continue;
        }
        targets.push(Target {
            url,
            name: entry.name,
            active: entry.active,
        });
    }

    if targets.is_empty() {
        return Err(ConfigError::Empty);
    }
    Ok(targets)
}
