//! Registry of optional libraries and the one-shot load/unload passes.
//!
//! `load` runs once at init and `unload` once at teardown. Both take
//! `&mut self`, so no lookup can overlap them; between the two passes the
//! registry is read-only and can be shared across threads.

use std::ffi::CString;

use optlib_core::{
    BUILTIN_LIBRARIES, LibraryDescriptor, LibraryId, LibraryVersion, ResolveError,
    resolve_link_target,
};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::dl::{DlError, DynamicLoader, LibraryHandle, SystemLoader};

/// Why a descriptor ended the load pass without a handle.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("shared library name `{name}` contains a NUL byte")]
    InvalidName { name: String },
    #[error("failed to load shared library `{name}`: {source}")]
    Open {
        name: String,
        #[source]
        source: DlError,
    },
    #[error("failed to resolve `{name}` version: {source}")]
    Version {
        name: String,
        #[source]
        source: ResolveError,
    },
}

impl LoadError {
    /// The library could not be opened at all (as opposed to being rejected
    /// after a successful open).
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::InvalidName { .. } | Self::Open { .. })
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(LibraryVersion),
    Unavailable(LoadError),
}

/// Per-descriptor result of [`Registry::load`], in id order.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// At least one library failed to open and the host runs degraded.
    pub degraded: bool,
    pub outcomes: Vec<(LibraryId, LoadOutcome)>,
}

impl LoadReport {
    #[must_use]
    pub fn outcome(&self, id: LibraryId) -> Option<&LoadOutcome> {
        self.outcomes
            .iter()
            .find(|(slot, _)| *slot == id)
            .map(|(_, outcome)| outcome)
    }

    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, LoadOutcome::Loaded(_)))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (LibraryId, &LoadError)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            LoadOutcome::Unavailable(err) => Some((*id, err)),
            LoadOutcome::Loaded(_) => None,
        })
    }
}

/// Runtime state of one descriptor. `version` is set iff `handle` is.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) descriptor: LibraryDescriptor,
    pub(crate) handle: Option<LibraryHandle>,
    pub(crate) version: Option<LibraryVersion>,
}

/// Fixed table of optional libraries plus their load state.
#[derive(Debug)]
pub struct Registry<L: DynamicLoader = SystemLoader> {
    pub(crate) loader: L,
    pub(crate) slots: Vec<Slot>,
}

impl Registry<SystemLoader> {
    /// Registry over the compiled-in [`BUILTIN_LIBRARIES`] table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(SystemLoader, BUILTIN_LIBRARIES)
    }
}

impl<L: DynamicLoader> Registry<L> {
    /// Descriptors get ids in iteration order, starting at zero.
    pub fn new(loader: L, descriptors: impl IntoIterator<Item = LibraryDescriptor>) -> Self {
        let slots = descriptors
            .into_iter()
            .map(|descriptor| Slot {
                descriptor,
                handle: None,
                version: None,
            })
            .collect();
        Self { loader, slots }
    }

    /// Number of descriptors; also the first invalid id.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn ids(&self) -> impl Iterator<Item = LibraryId> + use<L> {
        (0..self.slots.len()).map(LibraryId::new)
    }

    #[must_use]
    pub fn descriptor(&self, id: LibraryId) -> Option<&LibraryDescriptor> {
        self.slots.get(id.index()).map(|slot| &slot.descriptor)
    }

    #[must_use]
    pub fn is_loaded(&self, id: LibraryId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|slot| slot.handle.is_some())
    }

    /// Open every descriptor, best effort.
    ///
    /// A library that fails to open is skipped with warnings; one whose
    /// required version cannot be resolved is closed again. Neither stops the
    /// pass. Slots that already hold a handle are left untouched.
    pub fn load(&mut self) -> LoadReport {
        let mut report = LoadReport::default();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let id = LibraryId::new(index);
            let name = &slot.descriptor.name;

            if slot.handle.is_some() {
                debug!(library = %name, "shared library already loaded");
                let version = slot.version.unwrap_or_default();
                report.outcomes.push((id, LoadOutcome::Loaded(version)));
                continue;
            }

            match open_descriptor(&self.loader, &slot.descriptor) {
                Ok((handle, version)) => {
                    slot.handle = Some(handle);
                    slot.version = Some(version);
                    debug!(library = %name, %version, "loaded shared library");
                    report.outcomes.push((id, LoadOutcome::Loaded(version)));
                }
                Err(err) if err.is_missing() => {
                    if !report.degraded {
                        warn!("functionality may be limited: optional shared libraries are missing");
                        report.degraded = true;
                    }
                    warn!(library = %name, "{err}");
                    if let Some(notice) = &slot.descriptor.degradation_notice {
                        warn!("{name}: {notice}");
                    }
                    report.outcomes.push((id, LoadOutcome::Unavailable(err)));
                }
                Err(err) => {
                    error!(library = %name, "{err}");
                    report.outcomes.push((id, LoadOutcome::Unavailable(err)));
                }
            }
        }

        report
    }

    /// Close every open library. Close failures are logged and the slot is
    /// cleared anyway; calling this again is a no-op.
    pub fn unload(&mut self) {
        for slot in &mut self.slots {
            let Some(handle) = slot.handle.take() else {
                continue;
            };
            slot.version = None;
            if let Err(err) = self.loader.close(handle) {
                warn!(library = %slot.descriptor.name, "failed to unload `{}`: {err}", slot.descriptor.name);
            }
        }
    }

    /// Slot for `id`, or `None` with an internal-error event when `id` is
    /// outside the table.
    pub(crate) fn checked_slot(&self, id: LibraryId) -> Option<&Slot> {
        let slot = self.slots.get(id.index());
        if slot.is_none() {
            error!(
                id = id.index(),
                count = self.slots.len(),
                "BUG: shared library id is too big: {id}"
            );
        }
        slot
    }
}

impl<L: DynamicLoader> Drop for Registry<L> {
    fn drop(&mut self) {
        self.unload();
    }
}

/// Open one descriptor and, when it asks for one, resolve its version.
///
/// The version is resolved right after `dlopen` to keep the window between
/// mapping the file and reading its name on disk short.
fn open_descriptor<L: DynamicLoader>(
    loader: &L,
    descriptor: &LibraryDescriptor,
) -> Result<(LibraryHandle, LibraryVersion), LoadError> {
    let name = CString::new(descriptor.name.as_bytes()).map_err(|_| LoadError::InvalidName {
        name: descriptor.name.to_string(),
    })?;
    let handle = loader.open(&name).map_err(|source| LoadError::Open {
        name: descriptor.name.to_string(),
        source,
    })?;

    if !descriptor.requires_version {
        return Ok((handle, LibraryVersion::ZERO));
    }

    match resolve_version(loader, handle) {
        Ok(version) => Ok((handle, version)),
        Err(source) => {
            if let Err(err) = loader.close(handle) {
                warn!(library = %descriptor.name, "failed to unload `{}`: {err}", descriptor.name);
            }
            Err(LoadError::Version {
                name: descriptor.name.to_string(),
                source,
            })
        }
    }
}

/// Link map → symlink target (or the file itself) → `.so.X.Y.Z`.
pub fn resolve_version<L: DynamicLoader>(
    loader: &L,
    handle: LibraryHandle,
) -> Result<LibraryVersion, ResolveError> {
    let path = loader.link_map_path(handle)?;
    let resolved = resolve_link_target(&path)?;
    let version = resolved.version();
    if version.is_err() {
        debug!(
            path = %resolved.versioned_name().display(),
            "no shared library version in filename"
        );
    }
    version
}
