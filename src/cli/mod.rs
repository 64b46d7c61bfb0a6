pub mod commands;
pub mod output;

pub use commands::{BuildArgs, CliArgs, Commands, ImageOptions, PlanArgs};
pub use output::{OutputFormat, OutputFormatter, PlanReport};
