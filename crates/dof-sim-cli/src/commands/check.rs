use anyhow::{bail, Context, Result};
use dof_sim::reply::OperationReply;
use dof_sim::{scripts, Settings, SimBridge};

pub async fn run(settings: &Settings) -> Result<()> {
    let bridge = SimBridge::from_settings(&settings.bridge);
    tracing::info!(addr = bridge.addr(), "Probing Isaac Sim bridge");

    let output = bridge
        .exec(&scripts::probe())
        .await
        .with_context(|| format!("Isaac Sim bridge at {} is not usable", bridge.addr()))?;

    match OperationReply::parse(&output) {
        Some(reply) if reply.is_success() => {
            println!(
                "Isaac Sim bridge at {} is up ({})",
                bridge.addr(),
                reply.message_or("no version reported")
            );
            Ok(())
        }
        Some(reply) => bail!(
            "Isaac Sim bridge at {} ran the probe but it failed: {}",
            bridge.addr(),
            reply.message_or("unknown error")
        ),
        None => {
            println!(
                "Isaac Sim bridge at {} answered: {}",
                bridge.addr(),
                output.trim()
            );
            Ok(())
        }
    }
}
