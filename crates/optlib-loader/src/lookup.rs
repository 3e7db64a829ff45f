//! Symbol and version queries against a loaded [`Registry`].
//!
//! A missing library and a missing symbol look the same to callers: both
//! are `None`. Since registry state is frozen between `load` and `unload`,
//! hot paths should go through [`LazySymbol`] or [`SymbolCache`], which
//! resolve a name once and keep the answer (including a miss).

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::sync::OnceLock;

use optlib_core::{LibraryId, LibraryVersion};
use parking_lot::RwLock;
use tracing::debug;

use crate::dl::{DynamicLoader, Symbol};
use crate::registry::Registry;

impl<L: DynamicLoader> Registry<L> {
    /// Resolve `symbol` in library `id`.
    pub fn lookup(&self, id: LibraryId, symbol: &CStr) -> Option<Symbol> {
        let slot = self.checked_slot(id)?;
        let handle = slot.handle?;

        match self.loader.symbol(handle, symbol) {
            Ok(sym) => Some(sym),
            Err(err) => {
                debug!(
                    library = %slot.descriptor.name,
                    reason = %err,
                    "can't find `{}` function in {}",
                    symbol.to_string_lossy(),
                    slot.descriptor.name
                );
                None
            }
        }
    }

    /// Version recorded at load time; the zero triple when none was required.
    pub fn version(&self, id: LibraryId) -> Option<LibraryVersion> {
        let slot = self.checked_slot(id)?;
        slot.handle.and(slot.version)
    }
}

/// Resolve-once lookup owned by a single call site.
///
/// ```ignore
/// static STRLCPY: LazySymbol = LazySymbol::new(LibraryId::BSD, c"strlcpy");
///
/// if let Some(sym) = STRLCPY.get(&registry) { /* use libbsd */ }
/// ```
///
/// The cached address is only meaningful while the registry it came from
/// stays loaded.
#[derive(Debug)]
pub struct LazySymbol {
    id: LibraryId,
    name: &'static CStr,
    resolved: OnceLock<Option<Symbol>>,
}

impl LazySymbol {
    #[must_use]
    pub const fn new(id: LibraryId, name: &'static CStr) -> Self {
        Self {
            id,
            name,
            resolved: OnceLock::new(),
        }
    }

    pub fn get<L: DynamicLoader>(&self, registry: &Registry<L>) -> Option<Symbol> {
        *self
            .resolved
            .get_or_init(|| registry.lookup(self.id, self.name))
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    #[must_use]
    pub fn id(&self) -> LibraryId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &'static CStr {
        self.name
    }
}

/// Central resolve-once cache keyed by library and symbol name.
#[derive(Debug, Default)]
pub struct SymbolCache {
    entries: RwLock<HashMap<LibraryId, HashMap<CString, Option<Symbol>>>>,
}

impl SymbolCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<L: DynamicLoader>(
        &self,
        registry: &Registry<L>,
        id: LibraryId,
        name: &CStr,
    ) -> Option<Symbol> {
        let cached = self
            .entries
            .read()
            .get(&id)
            .and_then(|names| names.get(name))
            .copied();
        if let Some(hit) = cached {
            return hit;
        }

        let mut entries = self.entries.write();
        *entries
            .entry(id)
            .or_default()
            .entry(name.to_owned())
            .or_insert_with(|| registry.lookup(id, name))
    }

    /// Number of cached (id, name) pairs, hits and misses alike.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything; required after the registry is unloaded and loaded again.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
