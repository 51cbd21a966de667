use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use etcetera::{choose_app_strategy, AppStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::{DEFAULT_HOST, DEFAULT_PORT};

pub const ENV_PREFIX: &str = "DOF_SIM";
pub const DEFAULT_SERVER_NAME: &str = "dof-sim";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] ConfigError),
    #[error("Config file {0} does not exist")]
    MissingFile(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSettings {
    pub host: String,
    pub port: u16,
    pub connect_timeout_secs: u64,
    pub io_timeout_secs: u64,
}

impl BridgeSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_secs: 5,
            io_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub bridge: BridgeSettings,
    /// Pause before scene edits so the stage can go idle.
    pub settle_delay_ms: u64,
    pub server_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bridge: BridgeSettings::default(),
            settle_delay_ms: 2000,
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }
}

impl Settings {
    /// Default file location:
    /// - macOS/Linux: ~/.config/dof-sim/config.toml
    /// - Windows:     ~\AppData\Roaming\dof-sim\dof-sim\config\config.toml
    pub fn default_path() -> Option<PathBuf> {
        choose_app_strategy(crate::APP_STRATEGY.clone())
            .ok()
            .map(|strategy| strategy.in_config_dir("config.toml"))
    }

    /// Layer compiled defaults, the TOML file and `DOF_SIM__*` environment variables.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(SettingsError::MissingFile(path.to_path_buf()));
                }
                Some(File::from(path).required(true))
            }
            None => Self::default_path().map(|path| File::from(path).required(false)),
        };

        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("bridge.host", defaults.bridge.host)?
            .set_default("bridge.port", i64::from(defaults.bridge.port))?
            .set_default(
                "bridge.connect_timeout_secs",
                defaults.bridge.connect_timeout_secs,
            )?
            .set_default("bridge.io_timeout_secs", defaults.bridge.io_timeout_secs)?
            .set_default("settle_delay_ms", defaults.settle_delay_ms)?
            .set_default("server_name", defaults.server_name)?;

        if let Some(file) = file {
            builder = builder.add_source(file);
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
