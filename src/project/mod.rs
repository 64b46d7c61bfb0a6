//! Project model consumed by the native-image step
//!
//! The step does not resolve dependencies itself. It reads the project
//! identity and plugin configuration from `pom.xml` and the resolved
//! dependency archives from the `[[dependency]]` entries of `nativepack.toml`.

pub mod evaluator;
pub mod manifest;
pub mod pom;

pub use evaluator::ProjectEvaluator;
pub use manifest::{ProjectManifest, ProjectOverrides};
pub use pom::{ConfigNode, Plugin, PluginExecution, Pom};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PACKAGING: &str = "jar";
pub const DEFAULT_SCOPE: &str = "compile";
pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

/// Scopes whose artifacts end up on the image classpath
const IMAGE_CLASSPATH_SCOPES: [&str; 2] = ["compile", "runtime"];

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Pom {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Project {field} is unknown. Provide a pom.xml or set it in the [project] table")]
    MissingIdentity { field: &'static str },
}

/// A packaged module: the project itself or one of its dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(rename = "type", default = "default_packaging")]
    pub packaging: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_packaging() -> String {
    DEFAULT_PACKAGING.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl Artifact {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            packaging: default_packaging(),
            scope: default_scope(),
            file: None,
        }
    }

    pub fn with_packaging(mut self, packaging: &str) -> Self {
        self.packaging = packaging.to_string();
        self
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.packaging, self.version, self.scope
        )
    }
}

/// Evaluates `${...}` expressions against the build's properties
pub trait PropertyEvaluator {
    /// Returns `None` when the expression cannot be evaluated
    fn evaluate(&self, expression: &str) -> Option<String>;
}

/// Read access to other plugins' declared configuration
pub trait PluginConfigSource {
    /// Walks `path` inside the plugin-level `<configuration>`
    fn configuration_value(&self, plugin_key: &str, path: &[&str]) -> Option<String>;

    /// Walks `path` inside each `<execution>` configuration, in declaration order
    fn execution_values(&self, plugin_key: &str, path: &[&str]) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct Project {
    pub basedir: PathBuf,
    pub artifact: Artifact,
    pub dependencies: Vec<Artifact>,
    pub build_directory: PathBuf,
    pub final_name: String,
    pub properties: BTreeMap<String, String>,
    pub plugins: Vec<Plugin>,
}

impl Project {
    /// Builds the project from `<basedir>/pom.xml` (when present) and the manifest
    pub fn load(basedir: &Path, manifest: &ProjectManifest) -> Result<Self, ProjectError> {
        let pom_path = basedir.join("pom.xml");
        let pom = if pom_path.is_file() {
            debug!("Reading project model from {}", pom_path.display());
            let content = std::fs::read_to_string(&pom_path).map_err(|source| ProjectError::Io {
                path: pom_path.clone(),
                source,
            })?;
            Pom::parse(&content).map_err(|source| ProjectError::Pom {
                path: pom_path.clone(),
                source,
            })?
        } else {
            debug!("No pom.xml in {}, using manifest only", basedir.display());
            Pom::default()
        };

        Self::from_parts(basedir, pom, manifest)
    }

    pub fn from_parts(
        basedir: &Path,
        pom: Pom,
        manifest: &ProjectManifest,
    ) -> Result<Self, ProjectError> {
        let overrides = &manifest.project;

        let group_id = overrides
            .group_id
            .clone()
            .or(pom.group_id)
            .ok_or(ProjectError::MissingIdentity { field: "groupId" })?;
        let artifact_id = overrides
            .artifact_id
            .clone()
            .or(pom.artifact_id)
            .ok_or(ProjectError::MissingIdentity {
                field: "artifactId",
            })?;
        let version = overrides
            .version
            .clone()
            .or(pom.version)
            .ok_or(ProjectError::MissingIdentity { field: "version" })?;
        let packaging = overrides
            .packaging
            .clone()
            .or(pom.packaging)
            .unwrap_or_else(default_packaging);

        let build_directory = basedir.join(pom.build_directory.as_deref().unwrap_or("target"));

        let mut project = Project {
            basedir: basedir.to_path_buf(),
            artifact: Artifact::new(&group_id, &artifact_id, &version).with_packaging(&packaging),
            dependencies: manifest.dependencies.clone(),
            build_directory,
            final_name: String::new(),
            properties: pom.properties,
            plugins: pom.plugins,
        };

        project.final_name = pom
            .final_name
            .and_then(|name| ProjectEvaluator::new(&project).evaluate(&name))
            .unwrap_or_else(|| format!("{}-{}", artifact_id, version));

        project.artifact.file = match &overrides.file {
            Some(file) => Some(basedir.join(file)),
            None => {
                let packaged = project
                    .build_directory
                    .join(format!("{}.{}", project.final_name, DEFAULT_PACKAGING));
                packaged.is_file().then_some(packaged)
            }
        };

        Ok(project)
    }

    /// Dependencies that belong on the image classpath, in declaration order
    pub fn image_classpath_artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.dependencies
            .iter()
            .filter(|a| IMAGE_CLASSPATH_SCOPES.contains(&a.scope.as_str()))
    }

    pub fn plugin(&self, plugin_key: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.key() == plugin_key)
    }
}

impl PluginConfigSource for Project {
    fn configuration_value(&self, plugin_key: &str, path: &[&str]) -> Option<String> {
        self.plugin(plugin_key)?
            .configuration
            .as_ref()?
            .value_at(path)
            .map(str::to_string)
    }

    fn execution_values(&self, plugin_key: &str, path: &[&str]) -> Vec<String> {
        let Some(plugin) = self.plugin(plugin_key) else {
            return Vec::new();
        };
        plugin
            .executions
            .iter()
            .filter_map(|execution| execution.configuration.as_ref())
            .filter_map(|configuration| configuration.value_at(path))
            .map(str::to_string)
            .collect()
    }
}
