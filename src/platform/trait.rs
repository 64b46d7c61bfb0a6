//! Platform trait definition

use std::io;
use std::path::{Path, PathBuf};

/// Numeric owner of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerIds {
    pub uid: u32,
    pub gid: u32,
}

/// Abstraction over the host operating system for testability
pub trait Platform: Send + Sync {
    /// True when running on Windows
    fn is_windows(&self) -> bool;

    /// Home directory of the current user
    fn home_dir(&self) -> Option<PathBuf>;

    /// GraalVM / JDK installation used when no Java home is configured
    fn java_home(&self) -> Option<PathBuf>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file the current user may execute
    fn is_executable(&self, path: &Path) -> bool;

    /// POSIX owner of a path
    fn owner_ids(&self, path: &Path) -> io::Result<OwnerIds>;

    /// Separator used when joining classpath entries
    fn path_separator(&self) -> char {
        if self.is_windows() {
            ';'
        } else {
            ':'
        }
    }

    /// File name of the native-image launcher on this platform
    fn native_image_file_name(&self) -> &'static str {
        if self.is_windows() {
            "native-image.exe"
        } else {
            "native-image"
        }
    }
}
