//! Rendering of `nativepack plan` results
//!
//! JSON and YAML serialize the [`PlanReport`] as-is; the human format is a
//! short summary ending with the exact command line.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::ImageConfig;
use crate::image::{BuildPlan, DiscardedVolume, MainClassSource};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

/// What `nativepack plan` reports
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub project: String,
    pub skipped: bool,
    pub config: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<BuildPlan>,
}

impl PlanReport {
    pub fn skipped(project: String, config: &ImageConfig) -> Self {
        Self {
            project,
            skipped: true,
            config: config.to_display_map().into_iter().collect(),
            plan: None,
        }
    }

    pub fn planned(project: String, config: &ImageConfig, plan: BuildPlan) -> Self {
        Self {
            project,
            skipped: false,
            config: config.to_display_map().into_iter().collect(),
            plan: Some(plan),
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, report: &PlanReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).context("Failed to serialize plan to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(report).context("Failed to serialize plan to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(report)),
        }
    }

    fn format_human(&self, report: &PlanReport) -> String {
        let mut output = String::new();

        output.push_str(&format!("native-image plan for {}\n", report.project));
        output.push_str(RULE);
        output.push_str("\n\n");

        let Some(plan) = &report.plan else {
            output.push_str("Skipped (skip is set), nothing would run.\n");
            return output;
        };

        output.push_str(&format!(
            "Compiler:    {} ({})\n",
            plan.version.executable, plan.version.version
        ));
        match &plan.main_class {
            Some(main) => {
                let source = match &main.source {
                    MainClassSource::Explicit => "configured".to_string(),
                    MainClassSource::Plugin { plugin, path } => {
                        format!("{} {}", plugin, path.join(" -> "))
                    }
                };
                output.push_str(&format!("Main class:  {} [{}]\n", main.class_name, source));
            }
            None => output.push_str("Main class:  (none)\n"),
        }
        output.push_str(&format!("Working dir: {}\n\n", plan.workdir.display()));

        output.push_str("Classpath:\n");
        if plan.classpath.entries.is_empty() {
            output.push_str("\u{2514}\u{2500} (empty)\n");
        }
        for (i, entry) in plan.classpath.entries.iter().enumerate() {
            let connector = if i + 1 == plan.classpath.entries.len() {
                "\u{2514}"
            } else {
                "\u{251C}"
            };
            output.push_str(&format!("{}\u{2500} {}\n", connector, entry.display()));
        }

        if let Some(container) = &plan.container {
            output.push_str(&format!("\nContainer:   {}\n", container.image));
            match &container.user {
                Some(user) => output.push_str(&format!("User:        {}\n", user)),
                None => output.push_str("User:        (image default)\n"),
            }
            output.push_str("Volumes:\n");
            for mapping in &container.volumes.mappings {
                output.push_str(&format!("  - {}\n", mapping));
            }
        }

        let warnings = warnings(plan);
        if !warnings.is_empty() {
            output.push_str("\n\u{26A0} Warnings:\n");
            for warning in &warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output.push_str("\nCommand:\n");
        output.push_str(&plan.command.to_string());
        output.push('\n');

        output
    }
}

fn warnings(plan: &BuildPlan) -> Vec<String> {
    let mut warnings = Vec::new();

    for skipped in &plan.classpath.skipped {
        warnings.push(format!("ignored non-jar artifact {}", skipped));
    }
    for layout in &plan.classpath.layout_warnings {
        warnings.push(format!(
            "{}!/{} does not match recommended {} layout",
            layout.archive.display(),
            layout.entry,
            layout.expected
        ));
    }
    if let Some(mismatch) = &plan.version_mismatch {
        warnings.push(format!(
            "major.minor version mismatch: nativepack {} vs native-image {}",
            mismatch.own, mismatch.compiler
        ));
    }
    if let Some(container) = &plan.container {
        for DiscardedVolume {
            host,
            container: target,
            reason,
        } in &container.volumes.discarded
        {
            warnings.push(format!("volume {}:{} discarded: {}", host, target, reason));
        }
    }

    warnings
}
