use nativepack::cli::commands::{BuildArgs, CliArgs, Commands, ImageOptions, PlanArgs};
use nativepack::cli::output::{OutputFormat, OutputFormatter, PlanReport};
use nativepack::config::ImageConfig;
use nativepack::project::manifest::MANIFEST_FILE;
use nativepack::util::logging::{init_logging, LoggingConfig};
use nativepack::{
    NativeImageError, NativeImageStep, Project, ProjectManifest, RealPlatform, StepOutcome,
    SystemProcessRunner, NAME, VERSION,
};

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error, info};

fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_flags(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args),
        Commands::Plan(plan_args) => handle_plan(plan_args),
    };

    process::exit(exit_code);
}

struct Inputs {
    dir: PathBuf,
    config: ImageConfig,
    manifest: ProjectManifest,
}

/// Merges file, environment and flag settings; the project itself is not read yet
fn load_inputs(project_dir: Option<&Path>, options: &ImageOptions) -> Result<Inputs> {
    let dir = match project_dir {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let dir: PathBuf = dir
        .canonicalize()
        .with_context(|| format!("Project directory does not exist: {}", dir.display()))?;
    debug!("Project directory: {}", dir.display());

    let config_path = options
        .config
        .clone()
        .unwrap_or_else(|| dir.join(MANIFEST_FILE));
    let explicit_config = options.config.is_some();

    let (config, manifest) = if explicit_config || config_path.is_file() {
        debug!("Reading {}", config_path.display());
        (
            ImageConfig::load(&config_path)?,
            ProjectManifest::load(&config_path)?,
        )
    } else {
        debug!("No {} found, using defaults", config_path.display());
        (ImageConfig::default(), ProjectManifest::default())
    };

    let mut config = config.with_env_overrides();
    options.apply(&mut config)?;

    Ok(Inputs {
        dir,
        config,
        manifest,
    })
}

fn load_project(inputs: &Inputs) -> Result<Project> {
    inputs.config.validate()?;
    debug!("Configuration: {}", inputs.config);

    Project::load(&inputs.dir, &inputs.manifest)
        .with_context(|| format!("Failed to load project in {}", inputs.dir.display()))
}

fn project_name(project: &Project) -> String {
    format!(
        "{}:{}:{}",
        project.artifact.group_id, project.artifact.artifact_id, project.artifact.version
    )
}

fn report_step_error(e: &NativeImageError) -> i32 {
    error!("{}", e);
    match e {
        NativeImageError::MissingArtifact { .. } => {
            eprintln!("\nRun the package step first, or set `file` for each [[dependency]] in {}.", MANIFEST_FILE);
        }
        NativeImageError::JavaHomeNotFound | NativeImageError::ExecutableNotFound { .. } => {
            eprintln!("\nPossible solutions:");
            eprintln!("  - Point --java-home or GRAALVM_HOME at a GraalVM installation");
            eprintln!("  - Install the native-image component: gu install native-image");
            eprintln!("  - Build inside a container: --docker-image <image>");
        }
        _ => {}
    }
    e.exit_code()
}

fn handle_build(args: &BuildArgs) -> i32 {
    let inputs = match load_inputs(args.project_dir.as_deref(), &args.image) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };
    if inputs.config.skip {
        info!("Skipping native-image generation (skip is set)");
        return 0;
    }

    let project = match load_project(&inputs) {
        Ok(project) => project,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    let platform = RealPlatform::new();
    let runner = SystemProcessRunner::new();
    let step = NativeImageStep::new(&inputs.config, &project, &platform, &runner);

    match step.execute() {
        Ok(StepOutcome::Skipped) => 0,
        Ok(StepOutcome::Built(plan)) => {
            info!(
                "Built native image for {} in {}",
                project.artifact.artifact_id,
                plan.workdir.display()
            );
            0
        }
        Err(e) => report_step_error(&e),
    }
}

fn handle_plan(args: &PlanArgs) -> i32 {
    let inputs = match load_inputs(args.project_dir.as_deref(), &args.image) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    let report = if inputs.config.skip {
        info!("Skipping native-image generation (skip is set)");
        // only a label here
        let name = Project::load(&inputs.dir, &inputs.manifest)
            .map(|project| project_name(&project))
            .unwrap_or_else(|_| inputs.dir.display().to_string());
        PlanReport::skipped(name, &inputs.config)
    } else {
        let project = match load_project(&inputs) {
            Ok(project) => project,
            Err(e) => {
                error!("{:#}", e);
                return 1;
            }
        };
        let platform = RealPlatform::new();
        let runner = SystemProcessRunner::new();
        let step = NativeImageStep::new(&inputs.config, &project, &platform, &runner);
        match step.prepare() {
            Ok(plan) => PlanReport::planned(project_name(&project), &inputs.config, plan),
            Err(e) => return report_step_error(&e),
        }
    };

    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    match formatter.format(&report) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            1
        }
    }
}
