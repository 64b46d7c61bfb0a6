//! The native-image build step
//!
//! Runs classpath resolution, the version probe and command assembly, then
//! hands the command to a [`ProcessRunner`] and maps its exit status.

use super::classpath::{Classpath, ClasspathResolver};
use super::command::{compiler_args, BuildCommand, CommandBuilder, ContainerInvocation};
use super::identity::{ContainerUser, UidResolver};
use super::main_class::{MainClassResolver, ResolvedMainClass};
use super::version::{
    check_compatibility, CompilerLocation, VersionInfo, VersionMismatch, VersionProbe,
};
use super::volumes::{VolumeMapper, VolumeRequest, VolumeSet};
use crate::config::ImageConfig;
use crate::error::NativeImageError;
use crate::platform::Platform;
use crate::process::ProcessRunner;
use crate::project::{Project, ProjectEvaluator};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything decided before the compiler is spawned
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub classpath: Classpath,
    pub version: VersionInfo,
    pub version_mismatch: Option<VersionMismatch>,
    pub main_class: Option<ResolvedMainClass>,
    pub container: Option<ContainerPlan>,
    pub workdir: PathBuf,
    pub command: BuildCommand,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerPlan {
    pub image: String,
    pub user: Option<ContainerUser>,
    pub volumes: VolumeSet,
}

#[derive(Debug, Clone)]
pub enum StepOutcome {
    Skipped,
    Built(Box<BuildPlan>),
}

pub struct NativeImageStep<'a> {
    config: &'a ImageConfig,
    project: &'a Project,
    platform: &'a dyn Platform,
    runner: &'a dyn ProcessRunner,
}

impl<'a> NativeImageStep<'a> {
    pub fn new(
        config: &'a ImageConfig,
        project: &'a Project,
        platform: &'a dyn Platform,
        runner: &'a dyn ProcessRunner,
    ) -> Self {
        Self {
            config,
            project,
            platform,
            runner,
        }
    }

    /// Compiler working directory
    pub fn workdir(&self) -> PathBuf {
        self.config
            .output_directory
            .clone()
            .unwrap_or_else(|| self.project.build_directory.clone())
    }

    pub fn execute(&self) -> Result<StepOutcome, NativeImageError> {
        if self.config.skip {
            info!("Skipping native-image generation (skip is set)");
            return Ok(StepOutcome::Skipped);
        }

        let plan = self.prepare()?;

        info!("Executing: {}", plan.command);
        let code = self
            .runner
            .run_inherited(&plan.command, &plan.workdir)
            .map_err(|source| NativeImageError::Process {
                executable: plan.version.executable.clone(),
                source,
            })?;

        if code != Some(0) {
            return Err(NativeImageError::BuildFailed {
                command: plan.command.to_string(),
                code,
            });
        }

        info!("native-image finished in {}", plan.workdir.display());
        Ok(StepOutcome::Built(Box::new(plan)))
    }

    /// Resolves the classpath, probes the compiler and assembles the command
    pub fn prepare(&self) -> Result<BuildPlan, NativeImageError> {
        self.config.validate()?;

        let classpath =
            ClasspathResolver::resolve(self.project.image_classpath_artifacts(), &self.project.artifact)?;
        let classpath_arg = classpath.join(self.platform.path_separator());

        let workdir = self.workdir();
        let probe = VersionProbe::new(self.platform, self.runner);
        let (version, container) = match self.config.docker_image() {
            Some(image) => {
                let entry_point = self.config.docker_entry_point();
                let version = probe.probe(&CompilerLocation::Container(
                    ContainerInvocation::bare(&self.config.container_runtime, image, entry_point),
                ))?;
                (version, Some(self.container_plan(image, &workdir)?))
            }
            None => {
                let java_home = self.java_home()?;
                let version = probe.probe(&CompilerLocation::Local {
                    java_home: &java_home,
                })?;
                (version, None)
            }
        };

        let version_mismatch =
            check_compatibility(&self.config.compat_version, &version, container.is_some());

        let evaluator = ProjectEvaluator::new(self.project);
        let main_class = MainClassResolver::new(self.config.main_class.as_deref())
            .resolve(self.project, &evaluator)
            .cloned();
        if main_class.is_none() {
            debug!("No main class configured or declared by other plugins");
        }

        let builder = match &container {
            Some(plan) => CommandBuilder::container(&ContainerInvocation {
                runtime: &self.config.container_runtime,
                workdir: Some(&workdir),
                user: plan.user,
                volumes: &plan.volumes.mappings,
                entry_point: self.config.docker_entry_point(),
                image: &plan.image,
            }),
            None => CommandBuilder::local(Path::new(&version.executable)),
        };

        let command = builder
            .classpath(&classpath_arg)
            .args(compiler_args(
                &self.config.build_args,
                main_class.as_ref().map(|m| m.class_name.as_str()),
                self.config.image_name.as_deref(),
            ))
            .finish();

        Ok(BuildPlan {
            classpath,
            version,
            version_mismatch,
            main_class,
            container,
            workdir,
            command,
        })
    }

    fn java_home(&self) -> Result<PathBuf, NativeImageError> {
        self.config
            .java_home
            .clone()
            .or_else(|| self.platform.java_home())
            .ok_or(NativeImageError::JavaHomeNotFound)
    }

    fn container_plan(&self, image: &str, workdir: &Path) -> Result<ContainerPlan, NativeImageError> {
        let home = self
            .platform
            .home_dir()
            .ok_or(NativeImageError::HomeDirectoryNotFound)?;

        let user = UidResolver::new(self.platform, self.config.enforce_uid).resolve(&home)?;

        let local_repository = self
            .config
            .local_repository
            .clone()
            .unwrap_or_else(|| home.join(".m2").join("repository"));
        let volumes = VolumeMapper::new(self.platform).map(&VolumeRequest {
            home: &home,
            output_directory: workdir,
            local_repository: &local_repository,
            user_volumes: &self.config.volumes,
            disable_automatic_volumes: self.config.disable_automatic_volumes,
        });

        Ok(ContainerPlan {
            image: image.to_string(),
            user,
            volumes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockPlatform;
    use crate::process::{FakeOutcome, FakeRunner};
    use crate::project::{Artifact, Pom, ProjectManifest, ProjectOverrides};
    use std::fs::File;
    use std::io;
    use tempfile::TempDir;
    use zip::ZipWriter;

    const POM: &str = r#"<project>
        <groupId>com.example</groupId>
        <artifactId>app</artifactId>
        <version>1.0</version>
        <build>
            <plugins>
                <plugin>
                    <artifactId>maven-jar-plugin</artifactId>
                    <configuration>
                        <archive>
                            <manifest>
                                <mainClass>com.example.Main</mainClass>
                            </manifest>
                        </archive>
                    </configuration>
                </plugin>
            </plugins>
        </build>
    </project>"#;

    struct Fixture {
        temp: TempDir,
        project: Project,
        platform: MockPlatform,
    }

    fn empty_jar(path: &Path) {
        ZipWriter::new(File::create(path).unwrap()).finish().unwrap();
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib-1.0.jar");
        let app = temp.path().join("app-1.0.jar");
        empty_jar(&lib);
        empty_jar(&app);

        let manifest = ProjectManifest {
            project: ProjectOverrides {
                file: Some(app),
                ..Default::default()
            },
            dependencies: vec![
                Artifact::new("com.example", "lib", "1.0").with_file(&lib),
                Artifact::new("junit", "junit", "4.13").with_scope("test"),
            ],
        };
        let project =
            Project::from_parts(temp.path(), Pom::parse(POM).unwrap(), &manifest).unwrap();

        let platform = MockPlatform::new()
            .with_home("/home/builder")
            .with_java_home("/opt/graalvm")
            .with_owner(1000, 100);
        platform.add_executable("/opt/graalvm/lib/svm/bin/native-image");

        Fixture {
            temp,
            project,
            platform,
        }
    }

    fn config() -> ImageConfig {
        ImageConfig {
            compat_version: "22.3.0".to_string(),
            ..Default::default()
        }
    }

    fn version_output() -> FakeOutcome {
        FakeOutcome::success(&["GraalVM Version 22.3.0 (Java Version 17.0.5)"])
    }

    #[test]
    fn test_skip_spawns_nothing() {
        let fixture = fixture();
        let runner = FakeRunner::new();
        let config = ImageConfig {
            skip: true,
            ..config()
        };

        let outcome = NativeImageStep::new(&config, &fixture.project, &fixture.platform, &runner)
            .execute()
            .unwrap();

        assert!(matches!(outcome, StepOutcome::Skipped));
        assert!(runner.runs().is_empty());
    }

    #[test]
    fn test_local_build() {
        let fixture = fixture();
        let runner = FakeRunner::new().then(version_output());
        let config = ImageConfig {
            image_name: Some("app".to_string()),
            build_args: vec!["--no-fallback".to_string()],
            ..config()
        };

        let outcome = NativeImageStep::new(&config, &fixture.project, &fixture.platform, &runner)
            .execute()
            .unwrap();
        let StepOutcome::Built(plan) = outcome else {
            panic!("expected a build");
        };

        let root = fixture.temp.path().display().to_string();
        assert_eq!(
            plan.command.to_string(),
            format!(
                "/opt/graalvm/lib/svm/bin/native-image -cp {0}/lib-1.0.jar:{0}/app-1.0.jar --no-fallback -H:Class=com.example.Main -H:Name=app",
                root
            )
        );
        assert!(plan.version_mismatch.is_none());

        let runs = runner.runs();
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].inherited);
        assert!(runs[1].inherited);
        assert_eq!(runs[1].workdir, Some(fixture.temp.path().join("target")));
    }

    #[test]
    fn test_version_mismatch_is_only_a_warning() {
        let fixture = fixture();
        let runner = FakeRunner::new().then(FakeOutcome::success(&["GraalVM Version 21.9.0"]));
        let config = config();

        let outcome = NativeImageStep::new(&config, &fixture.project, &fixture.platform, &runner)
            .execute()
            .unwrap();
        let StepOutcome::Built(plan) = outcome else {
            panic!("expected a build");
        };
        assert!(plan.version_mismatch.is_some());
        assert_eq!(runner.runs().len(), 2);
    }

    #[test]
    fn test_build_failure_names_command() {
        let fixture = fixture();
        let runner = FakeRunner::new()
            .then(version_output())
            .then(FakeOutcome::exit(3));
        let config = config();

        let step = NativeImageStep::new(&config, &fixture.project, &fixture.platform, &runner);
        let err = step.execute().unwrap_err();
        let command = runner.runs()[1].command.join(" ");

        assert!(matches!(err, NativeImageError::BuildFailed { code: Some(3), .. }));
        assert_eq!(
            err.to_string(),
            format!("Execution of {} returned non-zero result", command)
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_spawn_failure_is_process_error() {
        let fixture = fixture();
        let runner = FakeRunner::new()
            .then(version_output())
            .then(FakeOutcome::SpawnError(io::ErrorKind::NotFound));
        let config = config();

        let err = NativeImageStep::new(&config, &fixture.project, &fixture.platform, &runner)
            .execute()
            .unwrap_err();
        assert!(matches!(err, NativeImageError::Process { .. }));
    }

    #[test]
    fn test_missing_artifact_aborts_before_probe() {
        let mut fixture = fixture();
        fixture.project.artifact.file = None;
        let runner = FakeRunner::new();
        let config = config();

        let err = NativeImageStep::new(&config, &fixture.project, &fixture.platform, &runner)
            .execute()
            .unwrap_err();
        assert!(matches!(err, NativeImageError::MissingArtifact { .. }));
        assert!(runner.runs().is_empty());
    }

    #[test]
    fn test_missing_java_home() {
        let fixture = fixture();
        let platform = MockPlatform::new();
        let runner = FakeRunner::new();
        let config = config();

        let err = NativeImageStep::new(&config, &fixture.project, &platform, &runner)
            .execute()
            .unwrap_err();
        assert!(matches!(err, NativeImageError::JavaHomeNotFound));
    }

    #[test]
    fn test_container_build() {
        let fixture = fixture();
        fixture.platform.add_path(fixture.temp.path().join("target"));
        let runner = FakeRunner::new().then(FakeOutcome::success(&["GraalVM Version 20.1.0"]));
        let config = ImageConfig {
            docker_image: Some("  graal:22.3  ".to_string()),
            docker_entry_point: Some("native-image".to_string()),
            main_class: Some("com.example.Override".to_string()),
            ..config()
        };

        let outcome = NativeImageStep::new(&config, &fixture.project, &fixture.platform, &runner)
            .execute()
            .unwrap();
        let StepOutcome::Built(plan) = outcome else {
            panic!("expected a build");
        };

        let target = fixture.temp.path().join("target").display().to_string();
        let root = fixture.temp.path().display().to_string();
        let mut mounts = vec![
            "/home/builder:/home/builder".to_string(),
            format!("{0}:{0}", target),
        ];
        mounts.sort();
        assert_eq!(
            plan.command.to_vec(),
            vec![
                "docker".to_string(),
                "container".to_string(),
                "run".to_string(),
                "--workdir".to_string(),
                target.clone(),
                "--user".to_string(),
                "1000:100".to_string(),
                "-v".to_string(),
                mounts[0].clone(),
                "-v".to_string(),
                mounts[1].clone(),
                "--rm".to_string(),
                "--entrypoint".to_string(),
                "native-image".to_string(),
                "graal:22.3".to_string(),
                "-cp".to_string(),
                format!("{0}/lib-1.0.jar:{0}/app-1.0.jar", root),
                "-H:Class=com.example.Override".to_string(),
            ]
        );
        // container builds never report skew
        assert!(plan.version_mismatch.is_none());
        assert_eq!(plan.version.executable, "docker");
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
    fn test_container_enforced_identity_failure() {
        let fixture = fixture();
        let platform = MockPlatform::new().without_owner();
        let runner = FakeRunner::new().then(version_output());
        let config = ImageConfig {
            docker_image: Some("graal".to_string()),
            enforce_uid: true,
            ..config()
        };

        let err = NativeImageStep::new(&config, &fixture.project, &platform, &runner)
            .execute()
            .unwrap_err();
        assert!(matches!(err, NativeImageError::IdentityRequired { .. }));
        assert_eq!(runner.runs().len(), 1);
    }

    #[test]
    fn test_container_without_home() {
        let fixture = fixture();
        let platform = MockPlatform::new().without_home();
        let runner = FakeRunner::new().then(version_output());
        let config = ImageConfig {
            docker_image: Some("graal".to_string()),
            ..config()
        };

        let err = NativeImageStep::new(&config, &fixture.project, &platform, &runner)
            .execute()
            .unwrap_err();
        assert!(matches!(err, NativeImageError::HomeDirectoryNotFound));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let fixture = fixture();
        let runner = FakeRunner::new();
        let config = ImageConfig {
            container_runtime: " ".to_string(),
            ..config()
        };

        let err = NativeImageStep::new(&config, &fixture.project, &fixture.platform, &runner)
            .prepare()
            .unwrap_err();
        assert!(matches!(err, NativeImageError::Config(_)));
    }
}
