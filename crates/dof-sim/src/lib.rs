use etcetera::AppStrategyArgs;
use once_cell::sync::Lazy;

pub static APP_STRATEGY: Lazy<AppStrategyArgs> = Lazy::new(|| AppStrategyArgs {
    top_level_domain: "dev".to_string(),
    author: "dof-sim".to_string(),
    app_name: "dof-sim".to_string(),
});

pub mod bridge;
pub mod editor;
pub mod errors;
pub mod logging;
pub mod mcp_server_runner;
pub mod reply;
pub mod robots;
pub mod scripts;
pub mod server;
pub mod settings;

pub use bridge::SimBridge;
pub use errors::DofSimError;
pub use server::DofSimServer;
pub use settings::Settings;
