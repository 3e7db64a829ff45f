//! Platform dynamic loader boundary.
//!
//! [`DynamicLoader`] is the seam between the registry's policy and the
//! loader primitives; [`SystemLoader`] implements it with `dlopen`, `dlsym`,
//! `dlclose` and `dlinfo(RTLD_DI_LINKMAP)` from the running libc.

use std::ffi::{CStr, OsStr, c_char, c_int, c_void};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::ptr::NonNull;

use optlib_core::ResolveError;
use optlib_core::dlfcn::{PATH_MAX, RTLD_DI_LINKMAP, RTLD_LAZY};
use thiserror::Error;

use crate::util::scan_c_string;

/// Owning token for a library opened by a [`DynamicLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryHandle(NonNull<c_void>);

// SAFETY: a dlopen handle is an opaque token; the loader serializes access to
// the object behind it.
unsafe impl Send for LibraryHandle {}
unsafe impl Sync for LibraryHandle {}

impl LibraryHandle {
    #[must_use]
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    #[must_use]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Address of a resolved symbol. Valid only while its library stays loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(NonNull<c_void>);

// SAFETY: the address itself is plain data; what callers do with it is
// governed by `Symbol::cast`.
unsafe impl Send for Symbol {}
unsafe impl Sync for Symbol {}

impl Symbol {
    #[must_use]
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    #[must_use]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// Reinterpret the address as a function pointer (or other pointer-sized) type.
    ///
    /// # Safety
    ///
    /// `F` must match the symbol's real signature and the owning library must
    /// remain loaded for as long as the result is used.
    #[must_use]
    pub unsafe fn cast<F: Copy>(self) -> F {
        assert_eq!(
            size_of::<F>(),
            size_of::<*mut c_void>(),
            "symbol cast target must be pointer-sized"
        );
        // SAFETY: sizes match (checked above); validity is the caller's contract.
        unsafe { std::mem::transmute_copy::<*mut c_void, F>(&self.as_ptr()) }
    }
}

/// Error text reported by the dynamic loader (`dlerror()`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DlError(pub String);

impl DlError {
    /// Consume the thread's pending `dlerror()` message.
    fn take() -> Self {
        // SAFETY: dlerror returns null or a NUL-terminated thread-local string
        // that stays valid until the next dl* call on this thread.
        let msg = unsafe { libc::dlerror() };
        if msg.is_null() {
            return Self("unknown dynamic loader error".to_owned());
        }
        // SAFETY: non-null dlerror result is NUL-terminated.
        Self(unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned())
    }
}

/// Clear stale `dlerror()` state before a loader call.
fn clear_dlerror() {
    // SAFETY: dlerror has no preconditions.
    unsafe { libc::dlerror() };
}

/// Loader primitives the registry is written against.
pub trait DynamicLoader {
    /// Open `name` with lazy binding.
    fn open(&self, name: &CStr) -> Result<LibraryHandle, DlError>;

    /// Look `name` up in an open library.
    fn symbol(&self, handle: LibraryHandle, name: &CStr) -> Result<Symbol, DlError>;

    /// Drop the reference taken by [`DynamicLoader::open`].
    fn close(&self, handle: LibraryHandle) -> Result<(), DlError>;

    /// The load path recorded in the library's link map.
    fn link_map_path(&self, handle: LibraryHandle) -> Result<PathBuf, ResolveError>;
}

/// The process's own dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoader;

impl DynamicLoader for SystemLoader {
    fn open(&self, name: &CStr) -> Result<LibraryHandle, DlError> {
        clear_dlerror();
        // SAFETY: `name` is NUL-terminated; running the library's initializers
        // is the point of the call.
        let handle = unsafe { libc::dlopen(name.as_ptr(), RTLD_LAZY) };
        LibraryHandle::from_raw(handle).ok_or_else(DlError::take)
    }

    fn symbol(&self, handle: LibraryHandle, name: &CStr) -> Result<Symbol, DlError> {
        clear_dlerror();
        // SAFETY: handle is open (owned by the caller's registry slot).
        let sym = unsafe { libc::dlsym(handle.as_ptr(), name.as_ptr()) };
        // A NULL-valued symbol is indistinguishable from a missing one here.
        Symbol::from_raw(sym).ok_or_else(DlError::take)
    }

    fn close(&self, handle: LibraryHandle) -> Result<(), DlError> {
        clear_dlerror();
        // SAFETY: handle came from dlopen and is closed exactly once by the registry.
        let rc = unsafe { libc::dlclose(handle.as_ptr()) };
        if rc == 0 { Ok(()) } else { Err(DlError::take()) }
    }

    #[cfg(target_os = "linux")]
    fn link_map_path(&self, handle: LibraryHandle) -> Result<PathBuf, ResolveError> {
        link_map::load_path(handle)
    }

    #[cfg(not(target_os = "linux"))]
    fn link_map_path(&self, _handle: LibraryHandle) -> Result<PathBuf, ResolveError> {
        Err(ResolveError::NoLinkMap {
            reason: "RTLD_DI_LINKMAP is not available on this platform".to_owned(),
        })
    }
}

#[cfg(target_os = "linux")]
mod link_map {
    use super::*;

    /// Leading fields of glibc/musl `struct link_map` (`<link.h>`).
    #[repr(C)]
    #[allow(dead_code)]
    struct LinkMap {
        l_addr: usize,
        l_name: *const c_char,
        l_ld: *mut c_void,
        l_next: *mut LinkMap,
        l_prev: *mut LinkMap,
    }

    unsafe extern "C" {
        fn dlinfo(handle: *mut c_void, request: c_int, info: *mut c_void) -> c_int;
    }

    pub(super) fn load_path(handle: LibraryHandle) -> Result<PathBuf, ResolveError> {
        let mut map: *mut LinkMap = std::ptr::null_mut();
        clear_dlerror();
        // SAFETY: handle is open; RTLD_DI_LINKMAP stores one `struct link_map *`.
        let rc = unsafe { dlinfo(handle.as_ptr(), RTLD_DI_LINKMAP, (&raw mut map).cast()) };
        if rc != 0 {
            return Err(ResolveError::NoLinkMap {
                reason: DlError::take().0,
            });
        }
        if map.is_null() {
            return Err(ResolveError::NoLinkMap {
                reason: "loader returned a null link_map".to_owned(),
            });
        }

        // SAFETY: the link_map belongs to the loader and lives while `handle` is open.
        let name = unsafe { (*map).l_name };
        if name.is_null() {
            return Err(ResolveError::EmptyName);
        }
        // SAFETY: l_name is NUL-terminated; the scan never passes PATH_MAX.
        let (len, terminated) = unsafe { scan_c_string(name, PATH_MAX) };
        if !terminated {
            return Err(ResolveError::PathTooLong { limit: PATH_MAX });
        }
        if len == 0 {
            return Err(ResolveError::EmptyName);
        }
        // SAFETY: `len` bytes before the terminator were just read.
        let bytes = unsafe { std::slice::from_raw_parts(name.cast::<u8>(), len) };
        Ok(PathBuf::from(OsStr::from_bytes(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_pointers_are_rejected() {
        assert!(LibraryHandle::from_raw(std::ptr::null_mut()).is_none());
        assert!(Symbol::from_raw(std::ptr::null_mut()).is_none());
    }

    #[test]
    fn missing_library_reports_dlerror_text() {
        let err = SystemLoader
            .open(c"liboptlib-definitely-missing.so")
            .unwrap_err();
        assert!(err.0.contains("liboptlib-definitely-missing.so"), "{err}");
    }

    #[test]
    fn libm_round_trip() {
        let Ok(handle) = SystemLoader.open(c"libm.so.6") else {
            eprintln!("Skipping: libm.so.6 not loadable");
            return;
        };
        let cos = SystemLoader.symbol(handle, c"cos").unwrap();
        let cos: extern "C" fn(f64) -> f64 = unsafe { cos.cast() };
        assert_eq!(cos(0.0), 1.0);
        assert!(SystemLoader.symbol(handle, c"optlib_no_such_symbol").is_err());

        let path = SystemLoader.link_map_path(handle).unwrap();
        assert!(path.to_string_lossy().contains("libm"), "{}", path.display());

        SystemLoader.close(handle).unwrap();
    }
}
