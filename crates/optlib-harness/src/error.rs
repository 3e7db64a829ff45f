use std::io;
use std::path::PathBuf;

use optlib_core::VersionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error("symbol name `{symbol}` contains a NUL byte")]
    InvalidSymbol { symbol: String },
    #[error("`{symbol}` not resolved in {library}")]
    Unresolved { library: String, symbol: String },
    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}
