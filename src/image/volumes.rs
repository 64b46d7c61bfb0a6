//! Bind mounts for containerized builds

use crate::platform::Platform;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// A host path made visible inside the build container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeMapping {
    pub host: String,
    pub container: String,
}

impl fmt::Display for VolumeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    HostMissing,
    NestedUnderHome,
    BlankContainerPath,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiscardReason::HostMissing => "host path does not exist",
            DiscardReason::NestedUnderHome => "host path is under the mounted home directory",
            DiscardReason::BlankContainerPath => "container path is blank",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscardedVolume {
    pub host: String,
    pub container: String,
    pub reason: DiscardReason,
}

/// Mounts in host path order, plus the user mappings that were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VolumeSet {
    pub mappings: Vec<VolumeMapping>,
    pub discarded: Vec<DiscardedVolume>,
}

impl VolumeSet {
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.host.as_str())
    }
}

pub struct VolumeRequest<'a> {
    pub home: &'a Path,
    pub output_directory: &'a Path,
    pub local_repository: &'a Path,
    pub user_volumes: &'a BTreeMap<String, String>,
    pub disable_automatic_volumes: bool,
}

pub struct VolumeMapper<'a> {
    platform: &'a dyn Platform,
}

impl<'a> VolumeMapper<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    pub fn map(&self, request: &VolumeRequest<'_>) -> VolumeSet {
        let automatic = !request.disable_automatic_volumes;
        let home = request.home;
        let mut mounts: BTreeMap<String, String> = BTreeMap::new();
        let mut discarded = Vec::new();

        if automatic {
            // home is mounted even when it does not exist
            let home_str = home.display().to_string();
            mounts.insert(home_str.clone(), home_str);

            for path in [request.output_directory, request.local_repository] {
                if self.platform.exists(path) && !path.starts_with(home) {
                    let path_str = path.display().to_string();
                    mounts.insert(path_str.clone(), path_str);
                }
            }
        }

        for (host, container) in request.user_volumes {
            let host_path = PathBuf::from(host);
            let reason = if host.trim().is_empty() || !self.platform.exists(&host_path) {
                error!("Local Volume {} does not exist", host);
                Some(DiscardReason::HostMissing)
            } else if automatic && host_path.starts_with(home) {
                warn!(
                    "Discarding volume map {}:{} since it is under the home directory {}",
                    host,
                    container,
                    home.display()
                );
                Some(DiscardReason::NestedUnderHome)
            } else if container.trim().is_empty() {
                warn!("Discarding volume map {}:{}: invalid image path", host, container);
                Some(DiscardReason::BlankContainerPath)
            } else {
                None
            };

            match reason {
                Some(reason) => discarded.push(DiscardedVolume {
                    host: host.clone(),
                    container: container.clone(),
                    reason,
                }),
                None => {
                    mounts.insert(host.clone(), container.clone());
                }
            }
        }

        let mappings: Vec<VolumeMapping> = mounts
            .into_iter()
            .map(|(host, container)| VolumeMapping { host, container })
            .collect();
        debug!("Computed {} volume mapping(s)", mappings.len());

        VolumeSet {
            mappings,
            discarded,
        }
    }
}
