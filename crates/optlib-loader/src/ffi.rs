//! C ABI over one process-wide registry of the built-in libraries.
//!
//! `optlib_shared_libs_load` is called once on init and
//! `optlib_shared_libs_unload` once on exit; lookups in between return null
//! on any failure.

use std::ffi::{CStr, c_char, c_int, c_uint, c_void};

use optlib_core::LibraryId;
use parking_lot::{RwLock, const_rwlock};

use crate::dl::Symbol;
use crate::registry::Registry;

static SHARED_LIBS: RwLock<Option<Registry>> = const_rwlock(None);

/// dlopen() all built-in libraries.
#[unsafe(no_mangle)]
pub extern "C" fn optlib_shared_libs_load() {
    let mut guard = SHARED_LIBS.write();
    guard.get_or_insert_with(Registry::builtin).load();
}

/// Run library destructors by closing every loaded library.
#[unsafe(no_mangle)]
pub extern "C" fn optlib_shared_libs_unload() {
    if let Some(registry) = SHARED_LIBS.write().as_mut() {
        registry.unload();
    }
}

/// Look up a function in a shared library. Returns null on failure.
///
/// # Safety
///
/// `func` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn optlib_shared_libs_lookup(id: c_uint, func: *const c_char) -> *mut c_void {
    if func.is_null() {
        return std::ptr::null_mut();
    }
    // SAFETY: non-null and NUL-terminated per the contract above.
    let func = unsafe { CStr::from_ptr(func) };

    let guard = SHARED_LIBS.read();
    guard
        .as_ref()
        .and_then(|registry| registry.lookup(LibraryId::new(id as usize), func))
        .map_or(std::ptr::null_mut(), Symbol::as_ptr)
}

/// Get the version of a loaded shared library. Returns 0 on success, -1 otherwise.
///
/// # Safety
///
/// Each out-pointer must be null or valid for a `c_uint` write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn optlib_shared_libs_get_version(
    id: c_uint,
    major: *mut c_uint,
    minor: *mut c_uint,
    patch: *mut c_uint,
) -> c_int {
    let guard = SHARED_LIBS.read();
    let Some(version) = guard
        .as_ref()
        .and_then(|registry| registry.version(LibraryId::new(id as usize)))
    else {
        return -1;
    };

    for (out, value) in [
        (major, version.major),
        (minor, version.minor),
        (patch, version.patch),
    ] {
        if !out.is_null() {
            // SAFETY: non-null out-pointers are writable per the contract above.
            unsafe { out.write(value) };
        }
    }
    0
}
