//! # optlib-core
//!
//! Safe building blocks for soft dependencies on native shared libraries.
//!
//! This crate knows nothing about `dlopen`; it owns the pieces that can be
//! expressed without touching the dynamic loader:
//!
//! - [`descriptor`]: the per-library policy table and its stable ids
//! - [`version`]: `.so.X.Y.Z` version extraction
//! - [`link`]: symlink-or-direct classification of loader-reported paths
//! - [`dlfcn`]: loader constants shared with the FFI layer
//!
//! The `optlib-loader` crate drives these from the platform loader.

#![deny(unsafe_code)]

pub mod descriptor;
pub mod dlfcn;
pub mod error;
pub mod link;
pub mod version;

pub use descriptor::{BUILTIN_COUNT, BUILTIN_LIBRARIES, LibraryDescriptor, LibraryId};
pub use error::{ResolveError, VersionError};
pub use link::{ResolvedPath, resolve_link_target};
pub use version::{LibraryVersion, parse_so_version};
