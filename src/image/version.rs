//! Locating the native-image compiler and probing its version

use super::command::{BuildCommand, CommandBuilder, ContainerInvocation};
use crate::error::NativeImageError;
use crate::platform::Platform;
use crate::process::ProcessRunner;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

pub const UNKNOWN_VERSION: &str = "unknown";
const VERSION_MARKER: &str = "GraalVM Version ";
const VERSION_FLAG: &str = "--version";

fn major_minor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+\.\d+)\.").expect("valid regex"))
}

/// Result of a version probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: String,
    /// Local compiler path, or the container runtime command
    pub executable: String,
}

/// Where the compiler runs
#[derive(Debug, Clone, Copy)]
pub enum CompilerLocation<'a> {
    Local { java_home: &'a Path },
    Container(ContainerInvocation<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionMismatch {
    pub own: String,
    pub compiler: String,
}

pub struct VersionProbe<'a> {
    platform: &'a dyn Platform,
    runner: &'a dyn ProcessRunner,
}

impl<'a> VersionProbe<'a> {
    pub fn new(platform: &'a dyn Platform, runner: &'a dyn ProcessRunner) -> Self {
        Self { platform, runner }
    }

    /// `lib/svm/bin/native-image` under `java_home`, then under `java_home/jre`
    pub fn locate_executable(&self, java_home: &Path) -> Result<PathBuf, NativeImageError> {
        let relative = Path::new("lib")
            .join("svm")
            .join("bin")
            .join(self.platform.native_image_file_name());

        let primary = java_home.join(&relative);
        if self.platform.is_executable(&primary) {
            return Ok(primary);
        }

        let fallback = java_home.join("jre").join(&relative);
        if self.platform.is_executable(&fallback) {
            return Ok(fallback);
        }

        Err(NativeImageError::ExecutableNotFound { path: fallback })
    }

    pub fn probe(&self, location: &CompilerLocation<'_>) -> Result<VersionInfo, NativeImageError> {
        let (command, executable) = match location {
            CompilerLocation::Local { java_home } => {
                let path = self.locate_executable(java_home)?;
                let command = CommandBuilder::local(&path).args([VERSION_FLAG]).finish();
                (command, path.display().to_string())
            }
            CompilerLocation::Container(invocation) => {
                info!("Checking: {}", invocation.image);
                let bare = ContainerInvocation::bare(
                    invocation.runtime,
                    invocation.image,
                    invocation.entry_point,
                );
                let command = CommandBuilder::container(&bare).args([VERSION_FLAG]).finish();
                (command, invocation.runtime.to_string())
            }
        };

        let version = self.scan_version(&command)?;
        debug!("native-image version {} ({})", version, executable);
        Ok(VersionInfo {
            version,
            executable,
        })
    }

    fn scan_version(&self, command: &BuildCommand) -> Result<String, NativeImageError> {
        let mut version: Option<String> = None;
        let code = self
            .runner
            .run_scanned(command, &mut |line| {
                if version.is_some() {
                    return;
                }
                if let Some(pos) = line.find(VERSION_MARKER) {
                    version = line[pos + VERSION_MARKER.len()..]
                        .split_whitespace()
                        .next()
                        .map(str::to_string);
                }
            })
            .map_err(|e| NativeImageError::ProbeExecution {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        if code != Some(0) {
            return Err(NativeImageError::ProbeExecution {
                command: command.to_string(),
                reason: match code {
                    Some(code) => format!("exited with status {}", code),
                    None => "terminated by signal".to_string(),
                },
            });
        }

        Ok(version.unwrap_or_else(|| UNKNOWN_VERSION.to_string()))
    }
}

/// Leading `major.minor` of a dotted version, or the input when there is none
pub fn major_minor(version: &str) -> &str {
    major_minor_pattern()
        .captures(version)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(version)
}

/// Compares major.minor of our own version against the probed compiler
///
/// Container builds are never reported.
pub fn check_compatibility(
    own_version: &str,
    info: &VersionInfo,
    containerized: bool,
) -> Option<VersionMismatch> {
    if containerized || major_minor(own_version) == major_minor(&info.version) {
        return None;
    }

    warn!(
        "Major.Minor version mismatch between nativepack ({}) and native-image executable ({})",
        own_version, info.version
    );
    Some(VersionMismatch {
        own: own_version.to_string(),
        compiler: info.version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockPlatform;
    use crate::process::{FakeOutcome, FakeRunner};
    use std::io;
    use yare::parameterized;

    const JAVA_HOME: &str = "/opt/graalvm";

    fn local_platform() -> MockPlatform {
        let platform = MockPlatform::new();
        platform.add_executable("/opt/graalvm/lib/svm/bin/native-image");
        platform
    }

    fn info(version: &str) -> VersionInfo {
        VersionInfo {
            version: version.to_string(),
            executable: "native-image".to_string(),
        }
    }

    #[parameterized(
        patch_differs = { "22.3.1", "22.3" },
        other_patch = { "22.3.9", "22.3" },
        older = { "21.9.0", "21.9" },
        suffix = { "22.3.0-SNAPSHOT", "22.3" },
        two_part = { "22.3", "22.3" },
        sentinel = { "unknown", "unknown" },
        embedded = { "CE 17.0.5+8-jvmci-22.3-b08", "17.0" },
    )]
    fn test_major_minor(input: &str, expected: &str) {
        assert_eq!(major_minor(input), expected);
    }

    #[test]
    fn test_compatibility() {
        assert!(check_compatibility("22.3.1", &info("22.3.9"), false).is_none());
        assert_eq!(
            check_compatibility("22.3.0", &info("21.9.0"), false),
            Some(VersionMismatch {
                own: "22.3.0".to_string(),
                compiler: "21.9.0".to_string(),
            })
        );
        assert!(check_compatibility("22.3.0", &info("21.9.0"), true).is_none());
        assert!(check_compatibility("22.3.0", &info(UNKNOWN_VERSION), false).is_some());
    }

    #[test]
    fn test_locate_prefers_lib_then_jre() {
        let platform = local_platform();
        let runner = FakeRunner::new();
        let probe = VersionProbe::new(&platform, &runner);
        assert_eq!(
            probe.locate_executable(Path::new(JAVA_HOME)).unwrap(),
            PathBuf::from("/opt/graalvm/lib/svm/bin/native-image")
        );

        let jre_only = MockPlatform::new();
        jre_only.add_executable("/opt/graalvm/jre/lib/svm/bin/native-image");
        let probe = VersionProbe::new(&jre_only, &runner);
        assert_eq!(
            probe.locate_executable(Path::new(JAVA_HOME)).unwrap(),
            PathBuf::from("/opt/graalvm/jre/lib/svm/bin/native-image")
        );
    }

    #[test]
    fn test_locate_windows_executable() {
        let platform = MockPlatform::new().windows();
        platform.add_executable("/opt/graalvm/lib/svm/bin/native-image.exe");
        let runner = FakeRunner::new();

        let path = VersionProbe::new(&platform, &runner)
            .locate_executable(Path::new(JAVA_HOME))
            .unwrap();
        assert!(path.ends_with("native-image.exe"));
    }

    #[test]
    fn test_locate_missing_executable() {
        let platform = MockPlatform::new();
        platform.add_path("/opt/graalvm/lib/svm/bin/native-image");
        let runner = FakeRunner::new();

        let err = VersionProbe::new(&platform, &runner)
            .locate_executable(Path::new(JAVA_HOME))
            .unwrap_err();
        assert!(matches!(err, NativeImageError::ExecutableNotFound { .. }));
        assert!(err.to_string().contains("jre"));
    }

    #[test]
    fn test_probe_local_version() {
        let platform = local_platform();
        let runner = FakeRunner::new().then(FakeOutcome::success(&[
            "native-image 22.3.0 2022-10-25",
            "GraalVM Version 22.3.0 (Java Version 17.0.5+8-jvmci-22.3-b08)",
            "GraalVM Version 99.0.0",
        ]));

        let info = VersionProbe::new(&platform, &runner)
            .probe(&CompilerLocation::Local {
                java_home: Path::new(JAVA_HOME),
            })
            .unwrap();

        assert_eq!(info.version, "22.3.0");
        assert_eq!(info.executable, "/opt/graalvm/lib/svm/bin/native-image");
        assert_eq!(
            runner.runs()[0].command,
            vec!["/opt/graalvm/lib/svm/bin/native-image", "--version"]
        );
    }

    #[test]
    fn test_probe_without_marker_is_unknown() {
        let platform = local_platform();
        let runner = FakeRunner::new().then(FakeOutcome::success(&["native-image 22.3.0"]));

        let info = VersionProbe::new(&platform, &runner)
            .probe(&CompilerLocation::Local {
                java_home: Path::new(JAVA_HOME),
            })
            .unwrap();
        assert_eq!(info.version, UNKNOWN_VERSION);
    }

    #[test]
    fn test_probe_container_ignores_mounts_and_user() {
        let platform = MockPlatform::new();
        let runner = FakeRunner::new().then(FakeOutcome::success(&["GraalVM Version 22.3.2"]));
        let invocation = ContainerInvocation {
            runtime: "docker",
            workdir: Some(Path::new("/work/target")),
            user: None,
            volumes: &[],
            entry_point: Some("native-image"),
            image: "graal:22.3",
        };

        let info = VersionProbe::new(&platform, &runner)
            .probe(&CompilerLocation::Container(invocation))
            .unwrap();

        assert_eq!(info.version, "22.3.2");
        assert_eq!(info.executable, "docker");
        assert_eq!(
            runner.runs()[0].command,
            vec![
                "docker",
                "container",
                "run",
                "--rm",
                "--entrypoint",
                "native-image",
                "graal:22.3",
                "--version"
            ]
        );
    }

    #[test]
    fn test_probe_non_zero_exit() {
        let platform = local_platform();
        let runner = FakeRunner::new().then(FakeOutcome::exit(2));

        let err = VersionProbe::new(&platform, &runner)
            .probe(&CompilerLocation::Local {
                java_home: Path::new(JAVA_HOME),
            })
            .unwrap_err();
        assert!(matches!(err, NativeImageError::ProbeExecution { .. }));
        assert!(err.to_string().contains("--version"));
    }

    #[test]
    fn test_probe_spawn_failure() {
        let platform = MockPlatform::new();
        let runner =
            FakeRunner::new().then(FakeOutcome::SpawnError(io::ErrorKind::PermissionDenied));

        let err = VersionProbe::new(&platform, &runner)
            .probe(&CompilerLocation::Container(ContainerInvocation::bare(
                "docker", "graal", None,
            )))
            .unwrap_err();
        assert!(matches!(err, NativeImageError::ProbeExecution { .. }));
    }
}
