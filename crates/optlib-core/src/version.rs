//! Version extraction from versioned shared-object filenames.
//!
//! Looks up the version part of a filename, i.e.
//! `"libnetfilter_conntrack.so.3.7.0"` yields `3.7.0`.

use std::fmt;

use crate::error::VersionError;

/// Marker preceding the version triple in a shared-object filename.
pub const SO_MARKER: &str = ".so.";

/// Semantic version of a loaded shared library.
///
/// Field order makes the derived `Ord` compare major, then minor, then patch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LibraryVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl LibraryVersion {
    /// Reported for libraries loaded without a version requirement.
    pub const ZERO: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns `true` if this version is `major.minor.patch` or newer.
    #[must_use]
    pub fn at_least(self, major: u32, minor: u32, patch: u32) -> bool {
        self >= Self::new(major, minor, patch)
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.major == 0 && self.minor == 0 && self.patch == 0
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse the `major.minor.patch` triple that follows the first `.so.` in `path`.
///
/// All three components must be present, in order, as plain decimal integers
/// separated by single dots. Anything after the patch component is ignored.
pub fn parse_so_version(path: &str) -> Result<LibraryVersion, VersionError> {
    let no_pattern = || VersionError::NoVersionPattern {
        path: path.to_owned(),
    };

    let start = path.find(SO_MARKER).ok_or_else(no_pattern)? + SO_MARKER.len();
    let rest = &path[start..];

    let (major, rest) = leading_component(rest).ok_or_else(no_pattern)?;
    let rest = rest.strip_prefix('.').ok_or_else(no_pattern)?;
    let (minor, rest) = leading_component(rest).ok_or_else(no_pattern)?;
    let rest = rest.strip_prefix('.').ok_or_else(no_pattern)?;
    let (patch, _) = leading_component(rest).ok_or_else(no_pattern)?;

    Ok(LibraryVersion::new(major, minor, patch))
}

/// Split a run of leading ASCII digits off `s` and parse it.
fn leading_component(s: &str) -> Option<(u32, &str)> {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    let value = s[..len].parse().ok()?;
    Some((value, &s[len..]))
}
