use super::{Project, PropertyEvaluator};
use regex::Regex;
use std::sync::OnceLock;

const MAX_DEPTH: usize = 8;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"))
}

/// Resolves `${...}` references against the project model, pom properties
/// and `env.*` variables
pub struct ProjectEvaluator<'a> {
    project: &'a Project,
}

impl<'a> ProjectEvaluator<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        let project = self.project;
        match name {
            "project.groupId" => Some(project.artifact.group_id.clone()),
            "project.artifactId" => Some(project.artifact.artifact_id.clone()),
            "project.version" => Some(project.artifact.version.clone()),
            "project.packaging" => Some(project.artifact.packaging.clone()),
            "project.basedir" | "basedir" => Some(project.basedir.display().to_string()),
            "project.build.directory" => Some(project.build_directory.display().to_string()),
            "project.build.finalName" if !project.final_name.is_empty() => {
                Some(project.final_name.clone())
            }
            _ => {
                if let Some(var) = name.strip_prefix("env.") {
                    return std::env::var(var).ok();
                }
                project.properties.get(name).cloned()
            }
        }
    }

    fn expand(&self, expression: &str, depth: usize) -> Option<String> {
        if depth > MAX_DEPTH {
            return None;
        }

        let pattern = reference_pattern();
        let mut result = String::with_capacity(expression.len());
        let mut last = 0;

        for captures in pattern.captures_iter(expression) {
            let whole = captures.get(0)?;
            let name = captures.get(1)?.as_str().trim();
            let value = self.lookup(name)?;
            let value = if pattern.is_match(&value) {
                self.expand(&value, depth + 1)?
            } else {
                value
            };

            result.push_str(&expression[last..whole.start()]);
            result.push_str(&value);
            last = whole.end();
        }

        result.push_str(&expression[last..]);
        Some(result)
    }
}

impl PropertyEvaluator for ProjectEvaluator<'_> {
    fn evaluate(&self, expression: &str) -> Option<String> {
        self.expand(expression, 0)
    }
}
