use anyhow::Result;
use dof_sim::mcp_server_runner::run_mcp_server;
use dof_sim::Settings;

pub async fn run(settings: &Settings) -> Result<()> {
    tokio::select! {
        result = run_mcp_server(settings) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down MCP server");
            Ok(())
        }
    }
}
