use super::{OwnerIds, Platform};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub struct RealPlatform;

impl RealPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for RealPlatform {
    fn is_windows(&self) -> bool {
        cfg!(windows)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn java_home(&self) -> Option<PathBuf> {
        ["GRAALVM_HOME", "JAVA_HOME"]
            .iter()
            .filter_map(|key| env::var(key).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[cfg(unix)]
    fn is_executable(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        fs::metadata(path)
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_executable(&self, path: &Path) -> bool {
        path.is_file()
    }

    #[cfg(unix)]
    fn owner_ids(&self, path: &Path) -> io::Result<OwnerIds> {
        use std::os::unix::fs::MetadataExt;

        let meta = fs::metadata(path)?;
        Ok(OwnerIds {
            uid: meta.uid(),
            gid: meta.gid(),
        })
    }

    #[cfg(not(unix))]
    fn owner_ids(&self, path: &Path) -> io::Result<OwnerIds> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("POSIX ownership is not available for {}", path.display()),
        ))
    }
}
