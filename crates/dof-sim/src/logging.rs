use anyhow::{Context, Result};
use etcetera::{choose_app_strategy, AppStrategy};
use std::fs;
use std::path::PathBuf;

use crate::APP_STRATEGY;

/// Returns the directory where log files should be stored for a specific component.
/// Creates the directory structure if it doesn't exist.
///
/// # Arguments
///
/// * `component` - The component name (e.g., "cli", "mcp")
/// * `use_date_subdir` - Whether to create a date-based subdirectory
pub fn get_log_directory(component: &str, use_date_subdir: bool) -> Result<PathBuf> {
    let strategy =
        choose_app_strategy(APP_STRATEGY.clone()).context("HOME environment variable not set")?;

    let base_log_dir = strategy
        .in_state_dir("logs")
        .unwrap_or_else(|| strategy.in_data_dir("logs"));

    let component_dir = base_log_dir.join(component);

    let log_dir = if use_date_subdir {
        let now = chrono::Local::now();
        component_dir.join(now.format("%Y-%m-%d").to_string())
    } else {
        component_dir
    };

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    Ok(log_dir)
}
