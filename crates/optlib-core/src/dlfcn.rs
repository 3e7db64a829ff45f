//! Dynamic linking constants.
//!
//! Values match glibc's `<dlfcn.h>` and `<linux/limits.h>`. The actual
//! dlopen/dlinfo/dlsym/dlclose invocations live in the loader crate.

/// Lazy binding: symbols are resolved on first use.
pub const RTLD_LAZY: i32 = 0x00001;

/// dlinfo request returning the object's `struct link_map *`.
pub const RTLD_DI_LINKMAP: i32 = 2;

/// Upper bound for any path read back from the loader or from `readlink`.
pub const PATH_MAX: usize = 4096;
