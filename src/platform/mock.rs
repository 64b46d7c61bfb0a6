use super::{OwnerIds, Platform};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Deterministic platform for tests
pub struct MockPlatform {
    windows: bool,
    home: Option<PathBuf>,
    java_home: Option<PathBuf>,
    owner: Option<OwnerIds>,
    paths: RwLock<HashSet<PathBuf>>,
    executables: RwLock<HashSet<PathBuf>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            windows: false,
            home: Some(PathBuf::from("/home/builder")),
            java_home: None,
            owner: Some(OwnerIds {
                uid: 1000,
                gid: 1000,
            }),
            paths: RwLock::new(HashSet::new()),
            executables: RwLock::new(HashSet::new()),
        }
    }

    pub fn windows(mut self) -> Self {
        self.windows = true;
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn without_home(mut self) -> Self {
        self.home = None;
        self
    }

    pub fn with_java_home(mut self, java_home: impl Into<PathBuf>) -> Self {
        self.java_home = Some(java_home.into());
        self
    }

    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.owner = Some(OwnerIds { uid, gid });
        self
    }

    /// Makes every owner lookup fail
    pub fn without_owner(mut self) -> Self {
        self.owner = None;
        self
    }

    /// Registers a path and all of its ancestors as existing
    pub fn add_path(&self, path: impl AsRef<Path>) {
        let mut paths = self.paths.write().unwrap();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            paths.insert(ancestor.to_path_buf());
        }
    }

    pub fn add_executable(&self, path: impl AsRef<Path>) {
        self.add_path(path.as_ref());
        self.executables
            .write()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MockPlatform {
    fn is_windows(&self) -> bool {
        self.windows
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn java_home(&self) -> Option<PathBuf> {
        self.java_home.clone()
    }

    fn exists(&self, path: &Path) -> bool {
        self.paths.read().unwrap().contains(path)
    }

    fn is_executable(&self, path: &Path) -> bool {
        self.executables.read().unwrap().contains(path)
    }

    fn owner_ids(&self, path: &Path) -> io::Result<OwnerIds> {
        self.owner.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot read owner of {}", path.display()),
            )
        })
    }
}
