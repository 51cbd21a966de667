use std::path::PathBuf;

use anyhow::{Context, Result};
use dof_sim::editor::{self, EditorKind, LaunchSpec};

pub struct EditorConfigOptions {
    pub kind: EditorKind,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub name: String,
    pub install: Option<PathBuf>,
}

fn launch_spec(options: &EditorConfigOptions) -> Result<LaunchSpec> {
    let mut launch = match &options.command {
        Some(command) => LaunchSpec::new(command.clone(), vec!["serve".to_string()]),
        None => LaunchSpec::current_exe().context("Could not determine the dof-sim executable")?,
    };
    if !options.args.is_empty() {
        launch.args = options.args.clone();
    }
    Ok(launch)
}

pub fn run(options: EditorConfigOptions) -> Result<()> {
    let launch = launch_spec(&options)?;

    match &options.install {
        Some(workspace) => {
            let path = editor::install(options.kind, workspace, &options.name, &launch)
                .with_context(|| format!("Failed to install config under {}", workspace.display()))?;
            println!("Wrote {}", path.display());
        }
        None => {
            let value = editor::render(options.kind, &options.name, &launch);
            editor::validate(options.kind, &value)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn options(install: Option<PathBuf>) -> EditorConfigOptions {
        EditorConfigOptions {
            kind: EditorKind::Cursor,
            command: Some("/opt/bin/dof-sim".to_string()),
            args: vec![],
            name: "dof-sim".to_string(),
            install,
        }
    }

    #[test]
    fn test_launch_spec_defaults_to_serve() {
        let launch = launch_spec(&options(None)).unwrap();
        assert_eq!(launch.command, "/opt/bin/dof-sim");
        assert_eq!(launch.args, vec!["serve"]);

        let mut custom = options(None);
        custom.args = vec!["serve".to_string(), "--port".to_string(), "9000".to_string()];
        assert_eq!(launch_spec(&custom).unwrap().args.len(), 3);
    }

    #[test]
    fn test_install_writes_cursor_file() {
        let dir = tempdir().unwrap();
        run(options(Some(dir.path().to_path_buf()))).unwrap();

        let content = fs::read_to_string(dir.path().join(".cursor").join("mcp.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["mcpServers"]["dof-sim"]["command"], "/opt/bin/dof-sim");
    }
}
