//! Error types shared by the version extractor and the link-map inspector.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("no `.so.X.Y.Z` version pattern in `{path}`")]
    NoVersionPattern { path: String },
}

/// Failure to turn a loaded handle into a versioned on-disk filename.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("can't get link_map: {reason}")]
    NoLinkMap { reason: String },
    #[error("link_map has no load path")]
    EmptyName,
    #[error("resolved path exceeds PATH_MAX ({limit} bytes)")]
    PathTooLong { limit: usize },
    #[error("failed to lookup `{}` link: {source}", path.display())]
    ReadLink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Version(#[from] VersionError),
}
