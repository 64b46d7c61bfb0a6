//! nativepack - GraalVM native-image build step
//!
//! Turns a packaged JVM application and its library dependencies into a
//! single native executable by running the external `native-image`
//! compiler, either from a local GraalVM installation or inside a container.
//!
//! # Example Usage
//!
//! ```no_run
//! use nativepack::{ImageConfig, NativeImageStep, Project, ProjectManifest, RealPlatform};
//! use nativepack::process::SystemProcessRunner;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = Path::new("my-service");
//! let manifest = ProjectManifest::load_from_dir(dir)?;
//! let project = Project::load(dir, &manifest)?;
//! let config = ImageConfig::default().with_env_overrides();
//!
//! let platform = RealPlatform::new();
//! let runner = SystemProcessRunner::new();
//! NativeImageStep::new(&config, &project, &platform, &runner).execute()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`image`]: classpath, volumes, identity, version probe, main class, command and the step itself
//! - [`project`]: project model read from `pom.xml` and `nativepack.toml`
//! - [`process`]: spawning and reaping the compiler
//! - [`platform`]: OS queries behind a trait

pub mod cli;
pub mod config;
pub mod error;
pub mod image;
pub mod platform;
pub mod process;
pub mod project;
pub mod util;

pub use config::{ConfigError, ImageConfig};
pub use error::NativeImageError;
pub use image::{BuildPlan, NativeImageStep, StepOutcome};
pub use platform::{MockPlatform, Platform, RealPlatform};
pub use process::{ProcessRunner, SystemProcessRunner};
pub use project::{Artifact, Project, ProjectError, ProjectManifest};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version, also the GraalVM release line nativepack is built against
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_nativepack() {
        assert_eq!(NAME, "nativepack");
    }

    #[test]
    fn test_version_has_major_minor() {
        assert_ne!(image::major_minor(VERSION), VERSION);
    }
}
