use crate::config::{ConfigError, ImageConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build native executables from packaged JVM applications with GraalVM native-image
#[derive(Parser, Debug)]
#[command(
    name = "nativepack",
    about = "Build native executables from packaged JVM applications with GraalVM native-image",
    version,
    author,
    long_about = "nativepack runs the GraalVM native-image compiler over a packaged JVM project. \
                  It resolves the image classpath from the project's dependencies, checks the \
                  compiler version, infers the main class from the project's plugin \
                  configuration and runs native-image locally or inside a container."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build the native image",
        long_about = "Resolves the image classpath, probes the native-image version and runs \
                      the compiler in the project's build directory.\n\n\
                      Examples:\n  \
                      nativepack build\n  \
                      nativepack build /path/to/project --image-name app\n  \
                      nativepack build --docker-image ghcr.io/graalvm/native-image:22.3.0\n  \
                      nativepack build --build-arg \"--no-fallback -H:+ReportExceptionStackTraces\""
    )]
    Build(BuildArgs),

    #[command(
        about = "Show what the build would run",
        long_about = "Performs every step of `build` except running the compiler and prints \
                      the classpath, compiler version, warnings and exact command line.\n\n\
                      Examples:\n  \
                      nativepack plan\n  \
                      nativepack plan /path/to/project --format json"
    )]
    Plan(PlanArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(
        value_name = "PROJECT_DIR",
        help = "Project directory (defaults to current directory)"
    )]
    pub project_dir: Option<PathBuf>,

    #[command(flatten)]
    pub image: ImageOptions,
}

#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    #[arg(
        value_name = "PROJECT_DIR",
        help = "Project directory (defaults to current directory)"
    )]
    pub project_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[command(flatten)]
    pub image: ImageOptions,
}

/// Options shared by `build` and `plan`, applied over file and environment settings
#[derive(Args, Debug, Clone, Default)]
pub struct ImageOptions {
    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        help = "Configuration file (defaults to PROJECT_DIR/nativepack.toml)"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Skip native-image generation")]
    pub skip: bool,

    #[arg(long, value_name = "CLASS", help = "Main class passed as -H:Class")]
    pub main_class: Option<String>,

    #[arg(long, value_name = "NAME", help = "Output binary name passed as -H:Name")]
    pub image_name: Option<String>,

    #[arg(
        long = "build-arg",
        value_name = "ARGS",
        allow_hyphen_values = true,
        help = "Extra native-image arguments, split on whitespace (repeatable)"
    )]
    pub build_args: Vec<String>,

    #[arg(long, value_name = "IMAGE", help = "Run native-image inside this container image")]
    pub docker_image: Option<String>,

    #[arg(long, value_name = "ENTRYPOINT", help = "Entry point override for the container")]
    pub docker_entry_point: Option<String>,

    #[arg(
        long = "volume",
        value_name = "HOST:CONTAINER",
        help = "Additional bind mount for container builds (repeatable)"
    )]
    pub volumes: Vec<String>,

    #[arg(long, help = "Do not mount home, output directory and local repository")]
    pub disable_automatic_volumes: bool,

    #[arg(long, help = "Fail when the container uid/gid cannot be determined")]
    pub enforce_uid: bool,

    #[arg(long, value_name = "DIR", help = "Compiler working directory")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "GraalVM installation for local builds")]
    pub java_home: Option<PathBuf>,

    #[arg(long, value_name = "COMMAND", help = "Container CLI (defaults to docker)")]
    pub container_runtime: Option<String>,
}

impl ImageOptions {
    /// Overrides `config` with the flags that were given
    pub fn apply(&self, config: &mut ImageConfig) -> Result<(), ConfigError> {
        if self.skip {
            config.skip = true;
        }
        if let Some(main_class) = &self.main_class {
            config.main_class = Some(main_class.clone());
        }
        if let Some(image_name) = &self.image_name {
            config.image_name = Some(image_name.clone());
        }
        if !self.build_args.is_empty() {
            config.build_args = self.build_args.clone();
        }
        if let Some(image) = &self.docker_image {
            config.docker_image = Some(image.clone());
        }
        if let Some(entry_point) = &self.docker_entry_point {
            config.docker_entry_point = Some(entry_point.clone());
        }
        for spec in &self.volumes {
            config.add_volume_spec(spec)?;
        }
        if self.disable_automatic_volumes {
            config.disable_automatic_volumes = true;
        }
        if self.enforce_uid {
            config.enforce_uid = true;
        }
        if let Some(dir) = &self.output_dir {
            config.output_directory = Some(dir.clone());
        }
        if let Some(java_home) = &self.java_home {
            config.java_home = Some(java_home.clone());
        }
        if let Some(runtime) = &self.container_runtime {
            config.container_runtime = runtime.clone();
        }
        Ok(())
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
