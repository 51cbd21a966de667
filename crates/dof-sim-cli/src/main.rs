use anyhow::Result;
use dof_sim_cli::cli::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli().await
}
