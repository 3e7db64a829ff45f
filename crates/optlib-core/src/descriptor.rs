//! Optional library descriptors and their stable identifiers.

use std::borrow::Cow;
use std::fmt;

/// Stable, dense, zero-based identifier of a descriptor within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LibraryId(usize);

impl LibraryId {
    /// `libbsd`, first entry of [`BUILTIN_LIBRARIES`].
    pub const BSD: Self = Self(0);

    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Static policy for one optional shared library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDescriptor {
    /// Name handed to the dynamic loader, e.g. `libbsd.so`.
    pub name: Cow<'static, str>,
    /// What the host loses when the library is unavailable.
    pub degradation_notice: Option<Cow<'static, str>>,
    /// Treat a missing `.so.X.Y.Z` version as a load failure.
    pub requires_version: bool,
}

impl LibraryDescriptor {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            degradation_notice: None,
            requires_version: false,
        }
    }

    /// Descriptor for a name only known at runtime (e.g. an absolute path).
    #[must_use]
    pub fn owned(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            degradation_notice: None,
            requires_version: false,
        }
    }

    #[must_use]
    pub fn with_notice(mut self, notice: impl Into<Cow<'static, str>>) -> Self {
        self.degradation_notice = Some(notice.into());
        self
    }

    #[must_use]
    pub fn requiring_version(mut self) -> Self {
        self.requires_version = true;
        self
    }
}

/// Number of entries in [`BUILTIN_LIBRARIES`].
pub const BUILTIN_COUNT: usize = 1;

/// Compiled-in table of optional libraries, indexed by [`LibraryId`].
pub const BUILTIN_LIBRARIES: [LibraryDescriptor; BUILTIN_COUNT] = [LibraryDescriptor {
    name: Cow::Borrowed("libbsd.so"),
    degradation_notice: Some(Cow::Borrowed(
        "Can't set title and using self-made strlcpy()",
    )),
    requires_version: false,
}];
