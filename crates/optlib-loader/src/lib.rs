//! # optlib-loader
//!
//! Soft dependencies on native shared libraries.
//!
//! A [`Registry`] holds a fixed table of optional libraries. [`Registry::load`]
//! opens each one best-effort at startup: a missing library only degrades the
//! host, and a library whose required `.so.X.Y.Z` version cannot be read is
//! closed again. After loading, [`Registry::lookup`] and [`Registry::version`]
//! answer queries keyed by [`LibraryId`]; [`LazySymbol`] and [`SymbolCache`]
//! memoize lookups for hot paths. [`Registry::unload`] (or dropping the
//! registry) closes everything at teardown.
//!
//! ```text
//! init:     load()   descriptors -> dlopen -> link map -> readlink -> version
//! steady:   lookup() / version()  (read-only, shareable across threads)
//! exit:     unload() dlclose, always completes
//! ```
//!
//! The [`ffi`] module exposes the same operations to C over a process-wide
//! registry of [`optlib_core::BUILTIN_LIBRARIES`].

#[cfg(not(unix))]
compile_error!("optlib-loader requires a Unix dynamic loader");

pub mod dl;
pub mod ffi;
pub mod lookup;
pub mod registry;
pub mod util;

pub use dl::{DlError, DynamicLoader, LibraryHandle, Symbol, SystemLoader};
pub use lookup::{LazySymbol, SymbolCache};
pub use optlib_core::{LibraryDescriptor, LibraryId, LibraryVersion};
pub use registry::{LoadError, LoadOutcome, LoadReport, Registry, resolve_version};
