//! Static registry mapping tool identifiers to invocation recipes.
//!
//! Built once at startup and shared read-only. Adding a tool means one
//! registry entry plus an adapter choice; the dispatcher and renderer
//! never change for it. A YAML file can extend or override the builtin
//! table at runtime.

use crate::adapter::{AdapterKind, ToolAdapter};
use crate::error::{Result, SweepError};
use crate::model::ToolFamily;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// What kind of filesystem target a tool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// A file or directory.
    Path,
    /// A single file (a pinned requirements file, for safety).
    File,
    /// A directory containing a `.git` database.
    GitRepo,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Path => "path",
            InputKind::File => "file",
            InputKind::GitRepo => "git_repo",
        }
    }

    /// Human description used in target-validation errors.
    pub fn expects(&self) -> &'static str {
        match self {
            InputKind::Path => "a file or directory",
            InputKind::File => "a file",
            InputKind::GitRepo => "a git repository",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Security,
    Linting,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Security => "security",
            ToolCategory::Linting => "linting",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One registered tool: how to invoke it and how to read its output.
pub struct ToolSpec {
    pub tool_id: String,
    pub command: String,
    /// Argument list with `{target}` placeholders, substituted per run.
    pub args_template: Vec<String>,
    pub input_kind: InputKind,
    pub category: ToolCategory,
    pub family: ToolFamily,
    adapter: Box<dyn ToolAdapter>,
}

impl ToolSpec {
    pub fn new(
        tool_id: impl Into<String>,
        command: impl Into<String>,
        args_template: Vec<&str>,
        input_kind: InputKind,
        category: ToolCategory,
        adapter: AdapterKind,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            command: command.into(),
            args_template: args_template.into_iter().map(String::from).collect(),
            input_kind,
            category,
            family: adapter.family(),
            adapter: adapter.build(),
        }
    }

    /// Like [`ToolSpec::new`] but with a caller-supplied adapter, for
    /// tools outside the builtin set.
    pub fn with_adapter(
        tool_id: impl Into<String>,
        command: impl Into<String>,
        args_template: Vec<&str>,
        input_kind: InputKind,
        category: ToolCategory,
        family: ToolFamily,
        adapter: Box<dyn ToolAdapter>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            command: command.into(),
            args_template: args_template.into_iter().map(String::from).collect(),
            input_kind,
            category,
            family,
            adapter,
        }
    }

    pub fn adapter(&self) -> &dyn ToolAdapter {
        self.adapter.as_ref()
    }

    /// Substitutes the target into the argument template. Arguments stay
    /// a discrete list; nothing is ever joined into a shell string.
    pub fn args_for(&self, target: &Path) -> Vec<String> {
        let target = target.display().to_string();
        self.args_template
            .iter()
            .map(|arg| arg.replace("{target}", &target))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RegistryConfig {
    #[serde(default)]
    tools: BTreeMap<String, ToolConfigEntry>,
}

#[derive(Debug, Deserialize)]
struct ToolConfigEntry {
    command: String,
    #[serde(default)]
    args_template: Vec<String>,
    input_kind: InputKind,
    adapter: AdapterKind,
    category: ToolCategory,
}

/// Identifier → ToolSpec table. Lookup is total: an unregistered id is
/// an explicit error, never a silent no-op.
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolSpec>,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// The builtin seven-tool table.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(ToolSpec::new(
            "bandit",
            "bandit",
            vec!["-r", "{target}", "-f", "json"],
            InputKind::Path,
            ToolCategory::Security,
            AdapterKind::Bandit,
        ));
        registry.register(ToolSpec::new(
            "safety",
            "safety",
            vec!["check", "--file", "{target}", "--json"],
            InputKind::File,
            ToolCategory::Security,
            AdapterKind::Safety,
        ));
        registry.register(ToolSpec::new(
            "trufflehog",
            "trufflehog",
            vec!["git", "file://{target}", "--json"],
            InputKind::GitRepo,
            ToolCategory::Security,
            AdapterKind::Trufflehog,
        ));
        registry.register(ToolSpec::new(
            "checkov",
            "checkov",
            vec!["--directory", "{target}", "--compact"],
            InputKind::Path,
            ToolCategory::Security,
            AdapterKind::Checkov,
        ));
        registry.register(ToolSpec::new(
            "pylint",
            "pylint",
            vec!["{target}"],
            InputKind::Path,
            ToolCategory::Linting,
            AdapterKind::Pylint,
        ));
        registry.register(ToolSpec::new(
            "mypy",
            "mypy",
            vec!["{target}"],
            InputKind::Path,
            ToolCategory::Linting,
            AdapterKind::Mypy,
        ));
        registry.register(ToolSpec::new(
            "radon",
            "radon",
            vec!["cc", "{target}", "-s"],
            InputKind::Path,
            ToolCategory::Linting,
            AdapterKind::Radon,
        ));
        registry
    }

    /// Registers a spec, replacing any existing entry with the same id.
    pub fn register(&mut self, spec: ToolSpec) {
        self.tools.insert(spec.tool_id.clone(), spec);
    }

    pub fn get(&self, tool_id: &str) -> Result<&ToolSpec> {
        self.tools
            .get(tool_id)
            .ok_or_else(|| SweepError::UnknownTool(tool_id.to_string()))
    }

    /// All registered ids, sorted.
    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// All registered specs, in id order.
    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values()
    }

    /// Derived category view, decoupled from the id→adapter mapping.
    pub fn tools_in_category(&self, category: ToolCategory) -> Vec<&str> {
        self.tools
            .values()
            .filter(|spec| spec.category == category)
            .map(|spec| spec.tool_id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Extends the table from a YAML file. Entries override builtin ids.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|source| SweepError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RegistryConfig =
            serde_yaml::from_str(&text).map_err(|source| SweepError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        for (tool_id, entry) in config.tools {
            if entry.command.trim().is_empty() {
                return Err(SweepError::Config(format!(
                    "tool '{tool_id}' has an empty command"
                )));
            }
            self.register(ToolSpec {
                tool_id: tool_id.clone(),
                command: entry.command,
                args_template: entry.args_template,
                input_kind: entry.input_kind,
                category: entry.category,
                family: entry.adapter.family(),
                adapter: entry.adapter.build(),
            });
        }
        Ok(())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
