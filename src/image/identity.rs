//! User identity for the build container

use crate::error::NativeImageError;
use crate::platform::{OwnerIds, Platform};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// `uid:gid` passed to `--user`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerUser(OwnerIds);

impl ContainerUser {
    pub fn uid(&self) -> u32 {
        self.0.uid
    }

    pub fn gid(&self) -> u32 {
        self.0.gid
    }
}

impl fmt::Display for ContainerUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.uid, self.0.gid)
    }
}

impl Serialize for ContainerUser {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub struct UidResolver<'a> {
    platform: &'a dyn Platform,
    enforce: bool,
}

impl<'a> UidResolver<'a> {
    pub fn new(platform: &'a dyn Platform, enforce: bool) -> Self {
        Self { platform, enforce }
    }

    /// Owner of `home`, or `None` when the container should use its default user
    ///
    /// The group is the owning group of `home`, not a copy of the user id.
    pub fn resolve(&self, home: &Path) -> Result<Option<ContainerUser>, NativeImageError> {
        if self.platform.is_windows() {
            debug!("No POSIX ownership on this platform, container runs as image default user");
            return Ok(None);
        }

        match self.platform.owner_ids(home) {
            Ok(ids) => {
                let user = ContainerUser(ids);
                debug!("Container user {} from owner of {}", user, home.display());
                Ok(Some(user))
            }
            Err(source) if self.enforce => Err(NativeImageError::IdentityRequired {
                home: home.to_path_buf(),
                source,
            }),
            Err(e) => {
                warn!(
                    "Could not determine uid/gid of {}: {}. Container runs as image default user",
                    home.display(),
                    e
                );
                Ok(None)
            }
        }
    }
}
