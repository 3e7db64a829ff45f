//! Integration test: the C ABI over the process-wide built-in registry.
//!
//! The host may or may not have libbsd installed, so assertions hold for
//! both cases. Everything runs in one test because the registry is global.
//!
//! Run: cargo test -p optlib-loader --test ffi_surface_test

use std::ffi::c_uint;

use optlib_core::BUILTIN_COUNT;
use optlib_loader::ffi::{
    optlib_shared_libs_get_version, optlib_shared_libs_load, optlib_shared_libs_lookup,
    optlib_shared_libs_unload,
};

fn get_version(id: c_uint) -> (i32, [c_uint; 3]) {
    let mut triple: [c_uint; 3] = [u32::MAX; 3];
    let [major, minor, patch] = &mut triple;
    // SAFETY: all three out-pointers are valid locals.
    let rc = unsafe { optlib_shared_libs_get_version(id, major, minor, patch) };
    (rc, triple)
}

#[test]
fn c_abi_lifecycle() {
    // Before the first load every query fails.
    assert_eq!(get_version(0).0, -1);
    // SAFETY: NUL-terminated literal.
    assert!(unsafe { optlib_shared_libs_lookup(0, c"strlcpy".as_ptr()) }.is_null());

    optlib_shared_libs_load();

    let bsd_loaded = match get_version(0) {
        (0, triple) => {
            // libbsd does not require a version, so the triple is zero.
            assert_eq!(triple, [0, 0, 0]);
            true
        }
        (-1, triple) => {
            assert_eq!(triple, [u32::MAX; 3], "failure must not write out-pointers");
            false
        }
        (rc, _) => panic!("unexpected return code {rc}"),
    };

    // SAFETY: NUL-terminated literal.
    let strlcpy = unsafe { optlib_shared_libs_lookup(0, c"strlcpy".as_ptr()) };
    assert_eq!(!strlcpy.is_null(), bsd_loaded);

    // SAFETY: a null name is explicitly allowed.
    assert!(unsafe { optlib_shared_libs_lookup(0, std::ptr::null()) }.is_null());

    let out_of_range = BUILTIN_COUNT as c_uint;
    assert_eq!(get_version(out_of_range).0, -1);
    // SAFETY: NUL-terminated literal.
    assert!(unsafe { optlib_shared_libs_lookup(out_of_range, c"strlcpy".as_ptr()) }.is_null());

    // Null out-pointers are skipped.
    // SAFETY: null out-pointers are explicitly allowed.
    let rc = unsafe {
        optlib_shared_libs_get_version(
            0,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    assert_eq!(rc, if bsd_loaded { 0 } else { -1 });

    optlib_shared_libs_unload();
    optlib_shared_libs_unload();
    assert_eq!(get_version(0).0, -1);
    // SAFETY: NUL-terminated literal.
    assert!(unsafe { optlib_shared_libs_lookup(0, c"strlcpy".as_ptr()) }.is_null());
}
