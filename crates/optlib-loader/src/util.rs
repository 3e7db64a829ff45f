//! Shared internal helpers for the FFI layer.

use std::ffi::c_char;

/// Scan a C string for its NUL terminator, reading at most `bound` bytes.
///
/// Returns `(len, terminated)`: `len` is the byte length before the first NUL
/// (or `bound` when none was seen) and `terminated` tells whether a NUL was
/// observed inside the bound.
///
/// # Safety
///
/// `ptr` must be non-null and valid to read up to the discovered length,
/// never more than `bound` bytes.
pub unsafe fn scan_c_string(ptr: *const c_char, bound: usize) -> (usize, bool) {
    for i in 0..bound {
        // SAFETY: caller guarantees `ptr..ptr + i` is readable for i < bound
        // until the terminator.
        if unsafe { *ptr.add(i) } == 0 {
            return (i, true);
        }
    }
    (bound, false)
}
