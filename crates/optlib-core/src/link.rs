//! Classification of the load path reported by the dynamic loader.
//!
//! The loader's link map records the name a library was opened under. For a
//! development symlink such as `libbsd.so` the versioned filename is the
//! symlink target; when the loader already reports the real file, the path is
//! used as-is.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::dlfcn::PATH_MAX;
use crate::error::ResolveError;
use crate::version::{LibraryVersion, parse_so_version};

/// Where the versioned filename of a loaded library came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    /// The load path is the library file itself.
    Direct(PathBuf),
    /// The load path is a symlink; `target` is what it points at.
    ViaSymlink { link: PathBuf, target: PathBuf },
}

impl ResolvedPath {
    /// The filename that carries the `.so.X.Y.Z` suffix.
    #[must_use]
    pub fn versioned_name(&self) -> &Path {
        match self {
            Self::Direct(path) => path,
            Self::ViaSymlink { target, .. } => target,
        }
    }

    pub fn version(&self) -> Result<LibraryVersion, ResolveError> {
        let name: Cow<'_, str> = self.versioned_name().to_string_lossy();
        Ok(parse_so_version(&name)?)
    }
}

/// Read `path` as a symlink, falling back to the path itself when it is a
/// regular file (`readlink` reports `EINVAL`).
pub fn resolve_link_target(path: &Path) -> Result<ResolvedPath, ResolveError> {
    if path.as_os_str().is_empty() {
        return Err(ResolveError::EmptyName);
    }
    if path.as_os_str().len() >= PATH_MAX {
        return Err(ResolveError::PathTooLong { limit: PATH_MAX });
    }

    match fs::read_link(path) {
        Ok(target) => {
            if target.as_os_str().len() >= PATH_MAX {
                return Err(ResolveError::PathTooLong { limit: PATH_MAX });
            }
            Ok(ResolvedPath::ViaSymlink {
                link: path.to_path_buf(),
                target,
            })
        }
        Err(err) if err.kind() == io::ErrorKind::InvalidInput => {
            Ok(ResolvedPath::Direct(path.to_path_buf()))
        }
        Err(source) => Err(ResolveError::ReadLink {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_file_resolves_directly() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("libdirect.so.1.2.3");
        fs::write(&lib, b"not really elf").unwrap();

        let resolved = resolve_link_target(&lib).unwrap();
        assert_eq!(resolved, ResolvedPath::Direct(lib.clone()));
        assert_eq!(resolved.versioned_name(), lib.as_path());
        assert_eq!(resolved.version().unwrap(), LibraryVersion::new(1, 2, 3));
    }

    #[test]
    fn symlink_resolves_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("libbsd.so.3.7.0");
        let link = dir.path().join("libbsd.so");
        fs::write(&real, b"").unwrap();
        std::os::unix::fs::symlink("libbsd.so.3.7.0", &link).unwrap();

        let resolved = resolve_link_target(&link).unwrap();
        assert_eq!(
            resolved,
            ResolvedPath::ViaSymlink {
                link: link.clone(),
                target: PathBuf::from("libbsd.so.3.7.0"),
            }
        );
        assert_eq!(resolved.version().unwrap(), LibraryVersion::new(3, 7, 0));
    }

    #[test]
    fn symlink_target_without_version_fails_parse() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("libplain.so");
        std::os::unix::fs::symlink("libplain-impl.so", &link).unwrap();

        let resolved = resolve_link_target(&link).unwrap();
        assert!(matches!(resolved.version(), Err(ResolveError::Version(_))));
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("libgone.so");
        assert!(matches!(
            resolve_link_target(&missing),
            Err(ResolveError::ReadLink { .. })
        ));
    }

    #[test]
    fn empty_and_oversized_paths_fail() {
        assert!(matches!(
            resolve_link_target(Path::new("")),
            Err(ResolveError::EmptyName)
        ));
        let long = "a".repeat(PATH_MAX + 1);
        assert!(matches!(
            resolve_link_target(Path::new(&long)),
            Err(ResolveError::PathTooLong { .. })
        ));
    }
}
