//! Errors that abort the native-image build step

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NativeImageError {
    /// A dependency reached the step without a packaged file
    #[error("Missing jar-file for {artifact}. Ensure nativepack runs after the package step.")]
    MissingArtifact { artifact: String },

    /// An archive could not be opened or its entries listed
    #[error("Artifact {artifact} cannot be added to image classpath: {source}")]
    ArchiveRead {
        artifact: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// `enforce_uid` is set and the home directory owner could not be read
    #[error("enforce_uid is set to true and uid/gid could not be determined for {}: {source}", home.display())]
    IdentityRequired {
        home: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not find executable native-image in {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("No Java home configured. Set java_home, GRAALVM_HOME or JAVA_HOME.")]
    JavaHomeNotFound,

    #[error("Home directory of the current user could not be determined")]
    HomeDirectoryNotFound,

    /// The version probe could not run, or exited non-zero
    #[error("Probing version info of native-image executable `{command}` failed: {reason}")]
    ProbeExecution { command: String, reason: String },

    /// The compiler ran and exited non-zero
    #[error("Execution of {command} returned non-zero result")]
    BuildFailed { command: String, code: Option<i32> },

    /// Spawning or awaiting the compiler failed
    #[error("Building image with {executable} failed: {source}")]
    Process {
        executable: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl NativeImageError {
    /// Exit code to report for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            NativeImageError::BuildFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}
