use super::{Artifact, ProjectError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "nativepack.toml";

/// Identity overrides from the `[project]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ProjectOverrides {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    /// Packaged project archive, relative to the project directory
    pub file: Option<PathBuf>,
}

/// Resolved build inputs the upstream build writes next to the project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub project: ProjectOverrides,
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<Artifact>,
}

impl ProjectManifest {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ProjectError> {
        toml::from_str(content).map_err(|source| ProjectError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Loads `<basedir>/nativepack.toml`, or an empty manifest when there is none
    pub fn load_from_dir(basedir: &Path) -> Result<Self, ProjectError> {
        let path = basedir.join(MANIFEST_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
