//! Keys that identify a watched file across re-examinations.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Comparable key for a monitored file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileIdentity {
    /// Normalized absolute path. Breaks under rename.
    Path(PathBuf),
    /// Volume + file id reported by the platform. Survives rename.
    Platform {
        volume: u64,
        file_id_high: u64,
        file_id_low: u64,
    },
}

impl FileIdentity {
    #[must_use]
    pub const fn is_platform(&self) -> bool {
        matches!(self, Self::Platform { .. })
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Platform {
                volume,
                file_id_high,
                file_id_low,
            } => write!(f, "{volume:x}:{file_id_high:x}:{file_id_low:x}"),
        }
    }
}

/// How the resolver keys files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityStrategy {
    /// Always key by path.
    Path,
    /// Prefer the platform file id, falling back to the path.
    #[default]
    Platform,
}

/// Maps a path to its [`FileIdentity`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver {
    strategy: IdentityStrategy,
}

impl IdentityResolver {
    #[must_use]
    pub const fn new(strategy: IdentityStrategy) -> Self {
        Self { strategy }
    }

    #[must_use]
    pub const fn strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    /// Resolve an identity for `path`.
    ///
    /// Never fails: when the platform cannot identify the file (missing
    /// file, unsupported host) the path identity is used instead.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> FileIdentity {
        match self.strategy {
            IdentityStrategy::Path => path_identity(path),
            IdentityStrategy::Platform => {
                platform_identity(path).unwrap_or_else(|| path_identity(path))
            }
        }
    }
}

/// Path-string identity: the absolute form of `path`.
#[must_use]
pub fn path_identity(path: &Path) -> FileIdentity {
    FileIdentity::Path(std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()))
}

/// Platform identity, or `None` when unavailable.
#[cfg(unix)]
#[must_use]
pub fn platform_identity(path: &Path) -> Option<FileIdentity> {
    use std::os::unix::fs::MetadataExt;

    let meta = std::fs::metadata(path).ok()?;
    Some(FileIdentity::Platform {
        volume: meta.dev(),
        file_id_high: 0,
        file_id_low: meta.ino(),
    })
}

/// Platform identity, or `None` when unavailable.
#[cfg(not(unix))]
#[must_use]
pub fn platform_identity(_path: &Path) -> Option<FileIdentity> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_path_identity_is_absolute() {
        let id = path_identity(Path::new("relative/a.txt"));
        match id {
            FileIdentity::Path(p) => {
                assert!(p.is_absolute());
                assert!(p.ends_with("relative/a.txt"));
            }
            FileIdentity::Platform { .. } => panic!("expected path identity"),
        }
    }

    #[test]
    fn test_path_strategy_ignores_platform() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        let resolver = IdentityResolver::new(IdentityStrategy::Path);
        assert_eq!(resolver.resolve(&file), path_identity(&file));
    }

    #[test]
    fn test_missing_file_falls_back_to_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.txt");

        let resolver = IdentityResolver::default();
        assert_eq!(resolver.strategy(), IdentityStrategy::Platform);
        assert_eq!(resolver.resolve(&missing), path_identity(&missing));
    }

    #[cfg(unix)]
    #[test]
    fn test_platform_identity_survives_rename() {
        let tmp = TempDir::new().unwrap();
        let before = tmp.path().join("before.txt");
        let after = tmp.path().join("after.txt");
        fs::write(&before, "x").unwrap();

        let resolver = IdentityResolver::new(IdentityStrategy::Platform);
        let id = resolver.resolve(&before);
        assert!(id.is_platform());

        fs::rename(&before, &after).unwrap();
        assert_eq!(resolver.resolve(&after), id);
    }

    #[test]
    fn test_display() {
        let id = FileIdentity::Platform {
            volume: 0x10,
            file_id_high: 0,
            file_id_low: 0xff,
        };
        assert_eq!(id.to_string(), "10:0:ff");
    }
}
