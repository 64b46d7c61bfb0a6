//! Entry point inference from other plugins' configuration

use crate::project::{PluginConfigSource, PropertyEvaluator};
use serde::Serialize;
use std::cell::OnceCell;
use tracing::{debug, info};

const SHADE_PLUGIN: &str = "org.apache.maven.plugins:maven-shade-plugin";
const ASSEMBLY_PLUGIN: &str = "org.apache.maven.plugins:maven-assembly-plugin";
const JAR_PLUGIN: &str = "org.apache.maven.plugins:maven-jar-plugin";

const TRANSFORMER_MAIN_CLASS: &[&str] = &["transformers", "transformer", "mainClass"];
const MANIFEST_MAIN_CLASS: &[&str] = &["archive", "manifest", "mainClass"];

/// One place a main class may be declared
pub trait MainClassProvider {
    fn plugin_key(&self) -> &'static str;

    fn path(&self) -> &'static [&'static str];

    /// Raw, unevaluated values in the order they are tried
    fn candidates(&self, source: &dyn PluginConfigSource) -> Vec<String>;
}

/// Plugin-level `<configuration>`
struct PluginConfiguration {
    plugin_key: &'static str,
    path: &'static [&'static str],
}

impl MainClassProvider for PluginConfiguration {
    fn plugin_key(&self) -> &'static str {
        self.plugin_key
    }

    fn path(&self) -> &'static [&'static str] {
        self.path
    }

    fn candidates(&self, source: &dyn PluginConfigSource) -> Vec<String> {
        source
            .configuration_value(self.plugin_key, self.path)
            .into_iter()
            .collect()
    }
}

/// `<configuration>` of each `<execution>`
struct PluginExecutions {
    plugin_key: &'static str,
    path: &'static [&'static str],
}

impl MainClassProvider for PluginExecutions {
    fn plugin_key(&self) -> &'static str {
        self.plugin_key
    }

    fn path(&self) -> &'static [&'static str] {
        self.path
    }

    fn candidates(&self, source: &dyn PluginConfigSource) -> Vec<String> {
        source.execution_values(self.plugin_key, self.path)
    }
}

/// Providers in priority order
pub const PROVIDERS: &[&dyn MainClassProvider] = &[
    &PluginExecutions {
        plugin_key: SHADE_PLUGIN,
        path: TRANSFORMER_MAIN_CLASS,
    },
    &PluginConfiguration {
        plugin_key: ASSEMBLY_PLUGIN,
        path: MANIFEST_MAIN_CLASS,
    },
    &PluginConfiguration {
        plugin_key: JAR_PLUGIN,
        path: MANIFEST_MAIN_CLASS,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MainClassSource {
    Explicit,
    Plugin { plugin: String, path: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMainClass {
    pub class_name: String,
    pub source: MainClassSource,
}

/// Resolves the main class once per build
pub struct MainClassResolver<'a> {
    explicit: Option<&'a str>,
    providers: &'a [&'a dyn MainClassProvider],
    resolved: OnceCell<Option<ResolvedMainClass>>,
}

impl<'a> MainClassResolver<'a> {
    pub fn new(explicit: Option<&'a str>) -> Self {
        Self::with_providers(explicit, PROVIDERS)
    }

    pub fn with_providers(
        explicit: Option<&'a str>,
        providers: &'a [&'a dyn MainClassProvider],
    ) -> Self {
        Self {
            explicit,
            providers,
            resolved: OnceCell::new(),
        }
    }

    pub fn resolve(
        &self,
        source: &dyn PluginConfigSource,
        evaluator: &dyn PropertyEvaluator,
    ) -> Option<&ResolvedMainClass> {
        self.resolved
            .get_or_init(|| self.find(source, evaluator))
            .as_ref()
    }

    fn find(
        &self,
        source: &dyn PluginConfigSource,
        evaluator: &dyn PropertyEvaluator,
    ) -> Option<ResolvedMainClass> {
        if let Some(explicit) = self.explicit {
            debug!("Using configured main class {}", explicit);
            return Some(ResolvedMainClass {
                class_name: explicit.to_string(),
                source: MainClassSource::Explicit,
            });
        }

        self.providers.iter().find_map(|provider| {
            let class_name = provider.candidates(source).iter().find_map(|raw| {
                let evaluated = evaluator.evaluate(raw);
                if evaluated.is_none() {
                    debug!("Could not evaluate {} from {}", raw, provider.plugin_key());
                }
                evaluated
            })?;
            info!(
                "Obtained main class from plugin {} with the following path: {}",
                provider.plugin_key(),
                provider.path().join(" -> ")
            );
            Some(ResolvedMainClass {
                class_name,
                source: MainClassSource::Plugin {
                    plugin: provider.plugin_key().to_string(),
                    path: provider.path().iter().map(|s| s.to_string()).collect(),
                },
            })
        })
    }
}
