//! Image classpath resolution
//!
//! Every jar on the classpath is opened and its `META-INF/native-image`
//! directory checked for the `<groupId>/<artifactId>/native-image.properties`
//! layout the compiler expects.

use crate::error::NativeImageError;
use crate::project::Artifact;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::ZipArchive;

const NATIVE_IMAGE_META_INF: &str = "META-INF/native-image/";
const NATIVE_IMAGE_PROPERTIES: &str = "native-image.properties";
const RECOGNIZED_PACKAGING: &str = "jar";

/// A `native-image.properties` outside its artifact's directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutWarning {
    pub archive: PathBuf,
    pub entry: String,
    pub expected: String,
}

/// Archives for the compiler, in dependency order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classpath {
    pub entries: Vec<PathBuf>,
    pub layout_warnings: Vec<LayoutWarning>,
    /// Artifacts ignored for not being jars
    pub skipped: Vec<String>,
}

impl Classpath {
    pub fn join(&self, separator: char) -> String {
        let mut joined = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                joined.push(separator);
            }
            joined.push_str(&entry.display().to_string());
        }
        joined
    }
}

#[derive(Debug, Default)]
pub struct ClasspathResolver {
    classpath: Classpath,
}

impl ClasspathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves dependencies first, then the project's own artifact
    pub fn resolve<'a, I>(dependencies: I, project: &Artifact) -> Result<Classpath, NativeImageError>
    where
        I: IntoIterator<Item = &'a Artifact>,
    {
        let mut resolver = Self::new();
        for artifact in dependencies {
            resolver.add(artifact)?;
        }
        resolver.add(project)?;
        Ok(resolver.finish())
    }

    pub fn add(&mut self, artifact: &Artifact) -> Result<(), NativeImageError> {
        if artifact.packaging != RECOGNIZED_PACKAGING {
            warn!("Ignoring non-jar type image classpath entry {}", artifact);
            self.classpath.skipped.push(artifact.to_string());
            return Ok(());
        }

        let file = artifact
            .file
            .as_deref()
            .ok_or_else(|| NativeImageError::MissingArtifact {
                artifact: artifact.to_string(),
            })?;
        info!("Image classpath entry: {} ({})", artifact, file.display());

        let warnings = check_layout(artifact, file).map_err(|source| {
            NativeImageError::ArchiveRead {
                artifact: artifact.to_string(),
                source,
            }
        })?;
        for warning in &warnings {
            warn!(
                "{}!/{} does not match recommended {} layout.",
                warning.archive.display(),
                warning.entry,
                warning.expected
            );
        }

        self.classpath.layout_warnings.extend(warnings);
        self.classpath.entries.push(file.to_path_buf());
        Ok(())
    }

    pub fn finish(self) -> Classpath {
        self.classpath
    }
}

fn check_layout(artifact: &Artifact, file: &Path) -> Result<Vec<LayoutWarning>, zip::result::ZipError> {
    let archive = ZipArchive::new(File::open(file)?)?;

    let warnings = archive
        .file_names()
        .filter_map(|name| name.strip_prefix(NATIVE_IMAGE_META_INF).map(|rel| (name, rel)))
        .filter(|(_, rel)| is_properties_file(rel))
        .filter(|(_, rel)| !matches_artifact(rel, artifact))
        .map(|(name, _)| LayoutWarning {
            archive: file.to_path_buf(),
            entry: name.to_string(),
            expected: format!(
                "{}${{groupId}}/${{artifactId}}/{}",
                NATIVE_IMAGE_META_INF, NATIVE_IMAGE_PROPERTIES
            ),
        })
        .collect();

    Ok(warnings)
}

fn is_properties_file(relative: &str) -> bool {
    relative.rsplit('/').next() == Some(NATIVE_IMAGE_PROPERTIES)
}

fn matches_artifact(relative: &str, artifact: &Artifact) -> bool {
    let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    matches!(
        segments.as_slice(),
        [group, id, NATIVE_IMAGE_PROPERTIES] if *group == artifact.group_id && *id == artifact.artifact_id
    )
}
