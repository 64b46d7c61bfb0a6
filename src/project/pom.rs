use super::DEFAULT_PLUGIN_GROUP;
use roxmltree::{Document, Node};
use std::collections::BTreeMap;

/// The parts of a `pom.xml` the native-image step reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub build_directory: Option<String>,
    pub final_name: Option<String>,
    pub plugins: Vec<Plugin>,
}

/// An element of a plugin `<configuration>` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigNode {
    pub name: String,
    pub value: Option<String>,
    pub children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follows `path` through first-match children and returns the leaf text
    pub fn value_at(&self, path: &[&str]) -> Option<&str> {
        let mut node = self;
        for segment in path {
            node = node.child(segment)?;
        }
        node.value.as_deref()
    }

    fn from_node(node: Node) -> Self {
        let children: Vec<ConfigNode> = node
            .children()
            .filter(|c| c.is_element())
            .map(ConfigNode::from_node)
            .collect();
        let value = if children.is_empty() {
            node.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        } else {
            None
        };
        Self {
            name: node.tag_name().name().to_string(),
            value,
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginExecution {
    pub id: Option<String>,
    pub configuration: Option<ConfigNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub group_id: String,
    pub artifact_id: String,
    pub configuration: Option<ConfigNode>,
    pub executions: Vec<PluginExecution>,
}

impl Plugin {
    /// `groupId:artifactId`
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

impl Pom {
    pub fn parse(content: &str) -> Result<Self, roxmltree::Error> {
        let doc = Document::parse(content)?;
        let root = doc.root_element();
        let parent = child_element(root, "parent");

        let mut pom = Pom {
            group_id: child_text(root, "groupId")
                .or_else(|| parent.and_then(|p| child_text(p, "groupId"))),
            artifact_id: child_text(root, "artifactId"),
            version: child_text(root, "version")
                .or_else(|| parent.and_then(|p| child_text(p, "version"))),
            packaging: child_text(root, "packaging"),
            ..Default::default()
        };

        if let Some(properties) = child_element(root, "properties") {
            for property in properties.children().filter(|n| n.is_element()) {
                let value = property.text().unwrap_or("").trim().to_string();
                pom.properties
                    .insert(property.tag_name().name().to_string(), value);
            }
        }

        if let Some(build) = child_element(root, "build") {
            pom.build_directory = child_text(build, "directory");
            pom.final_name = child_text(build, "finalName");
            if let Some(plugins) = child_element(build, "plugins") {
                pom.plugins = plugins
                    .children()
                    .filter(|n| n.has_tag_name("plugin"))
                    .filter_map(parse_plugin)
                    .collect();
            }
        }

        Ok(pom)
    }
}

fn parse_plugin(node: Node) -> Option<Plugin> {
    let artifact_id = child_text(node, "artifactId")?;
    let group_id = child_text(node, "groupId").unwrap_or_else(|| DEFAULT_PLUGIN_GROUP.to_string());

    let executions = child_element(node, "executions")
        .map(|executions| {
            executions
                .children()
                .filter(|n| n.has_tag_name("execution"))
                .map(|execution| PluginExecution {
                    id: child_text(execution, "id"),
                    configuration: child_element(execution, "configuration")
                        .map(ConfigNode::from_node),
                })
                .collect()
        })
        .unwrap_or_default();

    Some(Plugin {
        group_id,
        artifact_id,
        configuration: child_element(node, "configuration").map(ConfigNode::from_node),
        executions,
    })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn child_text(node: Node, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
