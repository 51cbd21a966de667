use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dof_sim::editor::EditorKind;
use dof_sim::Settings;

use crate::commands;
use crate::logging::setup_logging;

#[derive(Parser)]
#[command(name = "dof-sim", author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the dof-sim config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Where the Isaac Sim bridge is listening; overrides settings and environment.
#[derive(Args, Debug, Clone, Default)]
pub struct BridgeArgs {
    /// Bridge host
    #[arg(long)]
    pub host: Option<String>,

    /// Bridge port
    #[arg(long)]
    pub port: Option<u16>,
}

impl BridgeArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.bridge.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.bridge.port = port;
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Editor {
    Cursor,
    Vscode,
}

impl From<Editor> for EditorKind {
    fn from(editor: Editor) -> Self {
        match editor {
            Editor::Cursor => EditorKind::Cursor,
            Editor::Vscode => EditorKind::VsCode,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run the MCP server on stdio (this is what the editor launches)
    Serve {
        #[command(flatten)]
        bridge: BridgeArgs,
    },

    /// Check that the Isaac Sim bridge is reachable and executing code
    Check {
        #[command(flatten)]
        bridge: BridgeArgs,
    },

    /// List the robots that can be added to the stage
    Robots {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print or install the editor configuration that launches this server
    #[command(name = "editor-config")]
    EditorConfig {
        /// Which editor to configure
        #[arg(value_enum)]
        editor: Editor,

        /// Command the editor runs (defaults to this executable)
        #[arg(long)]
        command: Option<String>,

        /// Arguments passed to the command (defaults to `serve`)
        #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Server name used as the key in the editor config
        #[arg(long)]
        name: Option<String>,

        /// Merge the entry into the config file under this workspace directory
        #[arg(long, value_name = "DIR")]
        install: Option<PathBuf>,
    },
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    Settings::load(path.map(PathBuf::as_path)).context("Failed to load dof-sim settings")
}

pub async fn cli() -> Result<()> {
    let cli = Cli::parse();

    let log_name = match &cli.command {
        Command::Serve { .. } => "mcp",
        Command::Check { .. } => "check",
        Command::Robots { .. } => "robots",
        Command::EditorConfig { .. } => "editor-config",
    };
    if let Err(e) = setup_logging(Some(log_name)) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    dispatch(cli).await
}

/// Settings are only loaded by the subcommands that read them.
async fn dispatch(cli: Cli) -> Result<()> {
    let config = cli.config;
    match cli.command {
        Command::Serve { bridge } => {
            let mut settings = load_settings(config.as_ref())?;
            bridge.apply(&mut settings);
            commands::serve::run(&settings).await
        }
        Command::Check { bridge } => {
            let mut settings = load_settings(config.as_ref())?;
            bridge.apply(&mut settings);
            commands::check::run(&settings).await
        }
        Command::Robots { json } => commands::robots::run(json),
        Command::EditorConfig {
            editor,
            command,
            args,
            name,
            install,
        } => {
            let name = match name {
                Some(name) => name,
                None => load_settings(config.as_ref())?.server_name,
            };
            commands::editor_config::run(commands::editor_config::EditorConfigOptions {
                kind: editor.into(),
                command,
                args,
                name,
                install,
            })
        }
    }
}
