//! Machine-readable probe and lookup reports.

use std::ffi::CString;
use std::path::Path;

use optlib_loader::{DynamicLoader, LoadOutcome, LoadReport, Registry};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HarnessError;

/// State of one descriptor after a load pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryReport {
    pub id: usize,
    pub name: String,
    pub loaded: bool,
    /// `major.minor.patch`; `0.0.0` when the version was not required.
    pub version: Option<String>,
    pub requires_version: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub degraded: bool,
    pub libraries: Vec<LibraryReport>,
}

impl ProbeReport {
    /// Load `registry` and describe the result. The registry stays loaded.
    pub fn probe<L: DynamicLoader>(registry: &mut Registry<L>) -> Self {
        let load = registry.load();
        Self::collect(registry, &load)
    }

    pub fn collect<L: DynamicLoader>(registry: &Registry<L>, load: &LoadReport) -> Self {
        let libraries = registry
            .ids()
            .filter_map(|id| {
                let descriptor = registry.descriptor(id)?;
                let error = match load.outcome(id) {
                    Some(LoadOutcome::Unavailable(err)) => Some(err.to_string()),
                    _ => None,
                };
                Some(LibraryReport {
                    id: id.index(),
                    name: descriptor.name.to_string(),
                    loaded: registry.is_loaded(id),
                    version: registry.version(id).map(|v| v.to_string()),
                    requires_version: descriptor.requires_version,
                    notice: descriptor.degradation_notice.as_deref().map(str::to_owned),
                    error,
                })
            })
            .collect();

        Self {
            degraded: load.degraded,
            libraries,
        }
    }

    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.libraries.iter().filter(|lib| lib.loaded).count()
    }

    pub fn to_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), HarnessError> {
        std::fs::write(path, self.to_json()?).map_err(|source| HarnessError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "wrote probe report");
        Ok(())
    }
}

/// Whether one symbol resolves in the first library of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupReport {
    pub library: String,
    pub symbol: String,
    pub loaded: bool,
    pub resolved: bool,
}

impl LookupReport {
    pub fn run<L: DynamicLoader>(
        registry: &mut Registry<L>,
        symbol: &str,
    ) -> Result<Self, HarnessError> {
        let name = CString::new(symbol).map_err(|_| HarnessError::InvalidSymbol {
            symbol: symbol.to_owned(),
        })?;
        registry.load();

        let Some(id) = registry.ids().next() else {
            return Err(HarnessError::Unresolved {
                library: String::new(),
                symbol: symbol.to_owned(),
            });
        };
        let library = registry
            .descriptor(id)
            .map(|d| d.name.to_string())
            .unwrap_or_default();

        Ok(Self {
            loaded: registry.is_loaded(id),
            resolved: registry.lookup(id, &name).is_some(),
            library,
            symbol: symbol.to_owned(),
        })
    }

    /// Fails with [`HarnessError::Unresolved`] unless the symbol resolved.
    pub fn require_resolved(&self) -> Result<(), HarnessError> {
        if self.resolved {
            return Ok(());
        }
        Err(HarnessError::Unresolved {
            library: self.library.clone(),
            symbol: self.symbol.clone(),
        })
    }
}
