//! Configuration for the native-image build step
//!
//! Options are read from the `[image]` table of `nativepack.toml`, then
//! overridden by environment variables, then by command-line flags.
//!
//! # Environment Variables
//!
//! - `NATIVEPACK_SKIP`: Skip native-image generation (true|false)
//! - `NATIVEPACK_MAIN_CLASS`: Entry point class passed as `-H:Class`
//! - `NATIVEPACK_IMAGE_NAME`: Output binary name passed as `-H:Name`
//! - `NATIVEPACK_BUILD_ARGS`: Extra compiler arguments, whitespace separated
//! - `NATIVEPACK_DOCKER_IMAGE`: Run native-image inside this container image
//! - `NATIVEPACK_DOCKER_ENTRY_POINT`: Entry point override for the container
//! - `NATIVEPACK_DISABLE_AUTOMATIC_VOLUMES`: Do not mount home/output/repository (true|false)
//! - `NATIVEPACK_ENFORCE_UID`: Fail when uid/gid cannot be determined (true|false)
//! - `NATIVEPACK_OUTPUT_DIR`: Working directory of the compiler - default: project build directory
//! - `NATIVEPACK_LOCAL_REPOSITORY`: Maven local repository - default: "~/.m2/repository"
//! - `NATIVEPACK_JAVA_HOME`: GraalVM installation for local builds
//! - `NATIVEPACK_CONTAINER_RUNTIME`: Container CLI - default: "docker"

use crate::VERSION;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CONTAINER_RUNTIME: &str = "docker";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid volume mapping '{0}'. Expected HOST:CONTAINER")]
    InvalidVolume(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub skip: bool,
    pub main_class: Option<String>,
    pub image_name: Option<String>,
    pub build_args: Vec<String>,
    pub docker_image: Option<String>,
    pub docker_entry_point: Option<String>,
    pub volumes: BTreeMap<String, String>,
    pub disable_automatic_volumes: bool,
    pub enforce_uid: bool,
    pub output_directory: Option<PathBuf>,
    pub local_repository: Option<PathBuf>,
    pub java_home: Option<PathBuf>,
    pub container_runtime: String,
    pub compat_version: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            skip: false,
            main_class: None,
            image_name: None,
            build_args: Vec::new(),
            docker_image: None,
            docker_entry_point: None,
            volumes: BTreeMap::new(),
            disable_automatic_volumes: false,
            enforce_uid: false,
            output_directory: None,
            local_repository: None,
            java_home: None,
            container_runtime: DEFAULT_CONTAINER_RUNTIME.to_string(),
            compat_version: VERSION.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    image: ImageConfig,
}

impl ImageConfig {
    /// Parses the `[image]` table of a `nativepack.toml` document
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(file.image)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Applies `NATIVEPACK_*` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(skip) = env_bool("NATIVEPACK_SKIP") {
            self.skip = skip;
        }
        if let Some(main_class) = env_string("NATIVEPACK_MAIN_CLASS") {
            self.main_class = Some(main_class);
        }
        if let Some(image_name) = env_string("NATIVEPACK_IMAGE_NAME") {
            self.image_name = Some(image_name);
        }
        if let Some(build_args) = env_string("NATIVEPACK_BUILD_ARGS") {
            self.build_args = vec![build_args];
        }
        if let Some(image) = env_string("NATIVEPACK_DOCKER_IMAGE") {
            self.docker_image = Some(image);
        }
        if let Some(entry_point) = env_string("NATIVEPACK_DOCKER_ENTRY_POINT") {
            self.docker_entry_point = Some(entry_point);
        }
        if let Some(disable) = env_bool("NATIVEPACK_DISABLE_AUTOMATIC_VOLUMES") {
            self.disable_automatic_volumes = disable;
        }
        if let Some(enforce) = env_bool("NATIVEPACK_ENFORCE_UID") {
            self.enforce_uid = enforce;
        }
        if let Some(dir) = env_string("NATIVEPACK_OUTPUT_DIR") {
            self.output_directory = Some(PathBuf::from(dir));
        }
        if let Some(repo) = env_string("NATIVEPACK_LOCAL_REPOSITORY") {
            self.local_repository = Some(PathBuf::from(repo));
        }
        if let Some(java_home) = env_string("NATIVEPACK_JAVA_HOME") {
            self.java_home = Some(PathBuf::from(java_home));
        }
        if let Some(runtime) = env_string("NATIVEPACK_CONTAINER_RUNTIME") {
            self.container_runtime = runtime;
        }
        self
    }

    /// Adds a `HOST:CONTAINER` mapping, splitting on the last colon
    pub fn add_volume_spec(&mut self, spec: &str) -> Result<(), ConfigError> {
        let (host, container) = spec
            .rsplit_once(':')
            .filter(|(host, _)| !host.is_empty())
            .ok_or_else(|| ConfigError::InvalidVolume(spec.to_string()))?;
        self.volumes.insert(host.to_string(), container.to_string());
        Ok(())
    }

    /// Container image, trimmed; `None` when unset or blank
    pub fn docker_image(&self) -> Option<&str> {
        non_blank(self.docker_image.as_deref())
    }

    /// Container entry point, trimmed; `None` when unset or blank
    pub fn docker_entry_point(&self) -> Option<&str> {
        non_blank(self.docker_entry_point.as_deref())
    }

    pub fn is_containerized(&self) -> bool {
        self.docker_image().is_some()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.container_runtime.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Container runtime cannot be blank".to_string(),
            ));
        }
        if self.container_runtime.trim().contains(char::is_whitespace) {
            return Err(ConfigError::ValidationFailed(format!(
                "Container runtime must be a single command name, got '{}'",
                self.container_runtime
            )));
        }
        if let Some(name) = &self.image_name {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "Image name cannot be blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("skip".to_string(), self.skip.to_string());
        if let Some(main_class) = &self.main_class {
            map.insert("main_class".to_string(), main_class.clone());
        }
        if let Some(image_name) = &self.image_name {
            map.insert("image_name".to_string(), image_name.clone());
        }
        map.insert("build_args".to_string(), self.build_args.join(" "));
        if let Some(image) = self.docker_image() {
            map.insert("docker_image".to_string(), image.to_string());
        }
        if let Some(entry_point) = self.docker_entry_point() {
            map.insert("docker_entry_point".to_string(), entry_point.to_string());
        }
        map.insert(
            "disable_automatic_volumes".to_string(),
            self.disable_automatic_volumes.to_string(),
        );
        map.insert("enforce_uid".to_string(), self.enforce_uid.to_string());
        if let Some(dir) = &self.output_directory {
            map.insert("output_directory".to_string(), dir.display().to_string());
        }
        if let Some(java_home) = &self.java_home {
            map.insert("java_home".to_string(), java_home.display().to_string());
        }
        map.insert(
            "container_runtime".to_string(),
            self.container_runtime.clone(),
        );
        map.insert("compat_version".to_string(), self.compat_version.clone());

        map
    }
}

impl fmt::Display for ImageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Native Image Configuration:")?;
        writeln!(f, "  Skip: {}", self.skip)?;
        writeln!(
            f,
            "  Main Class: {}",
            self.main_class.as_deref().unwrap_or("(inferred)")
        )?;
        if let Some(name) = &self.image_name {
            writeln!(f, "  Image Name: {}", name)?;
        }
        match self.docker_image() {
            Some(image) => writeln!(f, "  Container Image: {}", image)?,
            None => writeln!(f, "  Container Image: (local build)")?,
        }
        writeln!(f, "  Container Runtime: {}", self.container_runtime)?;
        writeln!(f, "  Automatic Volumes: {}", !self.disable_automatic_volumes)?;
        writeln!(f, "  Enforce UID: {}", self.enforce_uid)?;
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().to_lowercase().parse::<bool>().ok())
}
