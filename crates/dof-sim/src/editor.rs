//! Editor launch configuration for the MCP server.
//!
//! Cursor reads `.cursor/mcp.json`:
//!
//! ```json
//! {"mcpServers": {"dof-sim": {"command": "<cmd>", "args": ["serve"]}}}
//! ```
//!
//! VS Code reads the `mcp` key of `.vscode/settings.json`:
//!
//! ```json
//! {"mcp": {"inputs": [], "servers": {"dof-sim": {"command": "<cmd>", "args": ["serve"], "env": {}}}}}
//! ```
//!
//! Both schemas belong to the editors. [`merge`] only ever touches the entry for
//! our server and leaves every other key as it found it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorConfigError {
    #[error("Expected '{path}' to be a JSON object")]
    NotAnObject { path: String },
    #[error("Invalid editor configuration: {0}")]
    Invalid(String),
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    Cursor,
    VsCode,
}

impl EditorKind {
    /// Location of the config file relative to the workspace root.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            EditorKind::Cursor => Path::new(".cursor").join("mcp.json"),
            EditorKind::VsCode => Path::new(".vscode").join("settings.json"),
        }
    }

    /// Keys leading from the document root to the map of servers.
    fn servers_path(&self) -> &'static [&'static str] {
        match self {
            EditorKind::Cursor => &["mcpServers"],
            EditorKind::VsCode => &["mcp", "servers"],
        }
    }
}

/// How the editor should start the server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl LaunchSpec {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    /// Launch this very executable with `serve`.
    pub fn current_exe() -> Result<Self, EditorConfigError> {
        let exe = std::env::current_exe()?;
        Ok(Self::new(
            exe.to_string_lossy().into_owned(),
            vec!["serve".to_string()],
        ))
    }

    fn entry(&self, kind: EditorKind) -> Value {
        let mut entry = json!({
            "command": self.command,
            "args": self.args,
        });
        if kind == EditorKind::VsCode {
            entry["env"] = json!(self.env);
        }
        entry
    }
}

/// The full document for `kind` containing only our server.
pub fn render(kind: EditorKind, server_name: &str, launch: &LaunchSpec) -> Value {
    let mut servers = Map::new();
    servers.insert(server_name.to_string(), launch.entry(kind));
    match kind {
        EditorKind::Cursor => json!({ "mcpServers": servers }),
        EditorKind::VsCode => json!({
            "mcp": {
                "inputs": [],
                "servers": servers
            }
        }),
    }
}

fn child_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
    trail: &str,
) -> Result<&'a mut Map<String, Value>, EditorConfigError> {
    parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| EditorConfigError::NotAnObject {
            path: trail.to_string(),
        })
}

/// Insert or replace our server's entry in an existing document.
pub fn merge(
    kind: EditorKind,
    mut existing: Value,
    server_name: &str,
    launch: &LaunchSpec,
) -> Result<Value, EditorConfigError> {
    let root = existing
        .as_object_mut()
        .ok_or_else(|| EditorConfigError::NotAnObject {
            path: "<root>".to_string(),
        })?;

    let path = kind.servers_path();
    let mut node = root;
    let mut trail = String::new();
    for key in path {
        if !trail.is_empty() {
            trail.push('.');
        }
        trail.push_str(key);
        node = child_object(node, key, &trail)?;
    }
    node.insert(server_name.to_string(), launch.entry(kind));

    if kind == EditorKind::VsCode {
        if let Some(Value::Object(mcp)) = existing.get_mut("mcp") {
            mcp.entry("inputs".to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
        }
    }

    Ok(existing)
}

/// Check that every server entry in `value` can actually be launched.
pub fn validate(kind: EditorKind, value: &Value) -> Result<(), EditorConfigError> {
    let mut node = value;
    for key in kind.servers_path() {
        node = node
            .get(key)
            .ok_or_else(|| EditorConfigError::Invalid(format!("missing '{}'", key)))?;
    }
    let servers = node
        .as_object()
        .ok_or_else(|| EditorConfigError::Invalid("servers must be an object".to_string()))?;

    for (name, entry) in servers {
        match entry.get("command").and_then(Value::as_str) {
            Some(command) if !command.trim().is_empty() => {}
            _ => {
                return Err(EditorConfigError::Invalid(format!(
                    "server '{}' needs a non-empty string command",
                    name
                )))
            }
        }
        if let Some(args) = entry.get("args") {
            let all_strings = args
                .as_array()
                .map(|args| args.iter().all(Value::is_string))
                .unwrap_or(false);
            if !all_strings {
                return Err(EditorConfigError::Invalid(format!(
                    "server '{}' args must be an array of strings",
                    name
                )));
            }
        }
    }

    if kind == EditorKind::VsCode {
        let inputs_ok = value
            .get("mcp")
            .and_then(|mcp| mcp.get("inputs"))
            .map(Value::is_array)
            .unwrap_or(true);
        if !inputs_ok {
            return Err(EditorConfigError::Invalid(
                "mcp.inputs must be an array".to_string(),
            ));
        }
    }

    Ok(())
}

/// Write our server entry into the editor config under `workspace_dir`.
///
/// Returns the path of the file that was written.
pub fn install(
    kind: EditorKind,
    workspace_dir: &Path,
    server_name: &str,
    launch: &LaunchSpec,
) -> Result<PathBuf, EditorConfigError> {
    let path = workspace_dir.join(kind.relative_path());

    let existing = if path.exists() {
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&content).map_err(|source| EditorConfigError::Parse {
                path: path.clone(),
                source,
            })?
        }
    } else {
        Value::Object(Map::new())
    };

    validate(kind, &render(kind, server_name, launch))?;
    let merged = merge(kind, existing, server_name, launch)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = serde_json::to_string_pretty(&merged)
        .map_err(|e| EditorConfigError::Invalid(e.to_string()))?;
    content.push('\n');
    fs::write(&path, content)?;

    tracing::info!(path = %path.display(), "Wrote {} config for {}", kind_label(kind), server_name);
    Ok(path)
}

fn kind_label(kind: EditorKind) -> &'static str {
    match kind {
        EditorKind::Cursor => "Cursor",
        EditorKind::VsCode => "VS Code",
    }
}
