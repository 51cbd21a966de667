use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Once;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

// Used to ensure we only set up tracing once
static INIT: Once = Once::new();

/// Returns the directory where log files should be stored.
/// Creates the directory structure if it doesn't exist.
fn get_log_directory() -> Result<PathBuf> {
    dof_sim::logging::get_log_directory("cli", true)
}

/// Sets up the logging infrastructure for the application.
/// This includes:
/// - File-based logging with JSON formatting (DEBUG level for our crates)
/// - Console output on stderr (WARN level), since stdout carries MCP frames
pub fn setup_logging(name: Option<&str>) -> Result<()> {
    setup_logging_internal(name, false)
}

fn default_filter() -> EnvFilter {
    EnvFilter::new("dof_sim=debug,dof_sim_cli=info,warn")
}

/// Internal function that allows bypassing the Once check for testing
fn setup_logging_internal(name: Option<&str>, force: bool) -> Result<()> {
    let mut result = Ok(());

    let mut setup = || {
        result = (|| {
            let log_dir = get_log_directory()?;
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

            let log_filename = match name {
                Some(name) => format!("{}-{}.log", timestamp, name),
                None => format!("{}.log", timestamp),
            };

            let file_appender = tracing_appender::rolling::RollingFileAppender::new(
                Rotation::NEVER,
                log_dir,
                log_filename,
            );

            let file_layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(file_appender)
                .with_ansi(false)
                .json();

            let console_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .compact();

            let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

            let layers = vec![
                file_layer.with_filter(env_filter).boxed(),
                console_layer.with_filter(LevelFilter::WARN).boxed(),
            ];

            let subscriber = Registry::default().with(layers);

            if force {
                // For testing, just create and use the subscriber without setting it globally
                let _guard = subscriber.set_default();
                tracing::warn!("Test log entry from setup");
                tracing::info!("Another test log entry from setup");
                Ok(())
            } else {
                subscriber
                    .try_init()
                    .context("Failed to set global subscriber")?;
                Ok(())
            }
        })();
    };

    if force {
        setup();
    } else {
        INIT.call_once(setup);
    }

    result
}
