// src/mirror/mod.rs
// =============================================================================
// This module copies remote directory listings to a local directory.
//
// Submodules:
// - pipeline: list_entries, download_entry and the mirror loop itself
//
// This file holds the data types the pipeline passes around and the errors
// it can stop with.
// =============================================================================

mod pipeline;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

use crate::fetch::FetchError;
use crate::listing::Entry;

pub use pipeline::mirror;

/// One remote directory: where to list it and where to fetch its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySpec {
    pub browse_base_url: Url,
    pub raw_base_url: Url,
    /// Path below both bases, ending in '/' (e.g. "cores/arduino/")
    pub relative_path: String,
}

impl DirectorySpec {
    pub fn new(browse_base_url: Url, raw_base_url: Url, relative_path: impl Into<String>) -> Self {
        Self {
            browse_base_url,
            raw_base_url,
            relative_path: relative_path.into(),
        }
    }
}

/// Outcome of one entry's download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    #[serde(flatten)]
    pub entry: Entry,
    pub local_path: PathBuf,
    pub success: bool,
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: Url,
        #[source]
        source: FetchError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot build a URL from '{base}' and '{path}': {reason}")]
    InvalidUrl {
        base: String,
        path: String,
        reason: String,
    },

    /// The listing produced a name that would escape the destination directory
    #[error("refusing to download entry with unsafe name '{0}'")]
    UnsafeEntryName(String),
}

/// A mirror run that stopped at its first error.
///
/// `results` holds every download that finished before the error; when the
/// error came from a download, that entry is the last one, marked failed.
#[derive(Debug, Error)]
#[error("mirror aborted after {} download(s)", .results.iter().filter(|r| r.success).count())]
pub struct MirrorFailure {
    pub results: Vec<DownloadResult>,
    #[source]
    pub error: MirrorError,
}
