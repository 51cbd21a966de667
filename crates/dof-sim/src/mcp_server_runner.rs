use anyhow::Result;
use rmcp::{transport::stdio, ServiceExt};

use crate::{DofSimServer, Settings};

/// Serve the DOF simulation tools over stdio until the client disconnects.
///
/// The caller is responsible for setting up logging before calling this function.
/// Nothing in here may write to stdout, which carries the MCP frames.
pub async fn run_mcp_server(settings: &Settings) -> Result<()> {
    tracing::info!(
        bridge = %settings.bridge.host,
        port = settings.bridge.port,
        "Starting MCP server"
    );
    serve_and_wait(DofSimServer::new(settings)).await
}

/// Helper function to run any MCP server with common error handling
pub async fn serve_and_wait<S>(server: S) -> Result<()>
where
    S: rmcp::ServerHandler,
{
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    tracing::info!("Server initialized and ready to handle requests");
    let reason = service.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", reason);

    Ok(())
}
