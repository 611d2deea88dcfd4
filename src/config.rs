use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::pot::PotSettings;

/// Default configuration file name, looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "htcpcp.toml";

/// Main configuration structure for the coffee pot server
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PotConfig {
    /// Free-form label reported by GET and PROPFIND
    pub coffee_type: String,
    /// Seconds spent brewing before the pot starts pouring
    pub brew_time_sec: u64,
    /// Seconds the pot pours before stopping on its own
    pub max_pour_time_sec: u64,
    /// Upper bound for a single brew or stop-pouring command
    pub action_timeout_sec: u64,
    /// Re-read this file before each request while the pot is Ready
    pub reload_on_request: bool,
    /// External commands driving the physical pot
    pub commands: CommandsConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandsConfig {
    /// Command run when brewing starts (empty disables it)
    pub brew_command: String,
    /// Command run when a client stops the pour (empty disables it)
    pub stop_pouring_command: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

impl Default for PotConfig {
    fn default() -> Self {
        let pot = PotSettings::default();
        Self {
            coffee_type: pot.coffee_type,
            brew_time_sec: pot.brew_time_sec,
            max_pour_time_sec: pot.max_pour_time_sec,
            action_timeout_sec: 60,
            reload_on_request: true,
            commands: CommandsConfig {
                brew_command: pot.brew_command,
                stop_pouring_command: pot.stop_pouring_command,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
            },
        }
    }
}

impl PotConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. The configuration file, if it exists
    /// 3. Environment variables (prefixed with HTCPCP_, nested keys split by `__`)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut builder = Config::builder().add_source(Config::try_from(&PotConfig::default())?);

        if path.exists() {
            let file = match path.extension() {
                Some(_) => File::from(path),
                None => File::from(path).format(FileFormat::Toml),
            };
            builder = builder.add_source(file);
        }

        builder = builder.add_source(
            Environment::with_prefix("HTCPCP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    ///
    /// The format follows the extension so that `load` can read the file
    /// back: `.json` is written as JSON, `.toml` or no extension as TOML.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            None | Some("toml") => toml::to_string_pretty(self)?,
            Some("json") => serde_json::to_string_pretty(self)?,
            Some(other) => anyhow::bail!(
                "Unsupported configuration format '.{other}' for {}, use .toml or .json",
                path.display()
            ),
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// The part of the configuration the pot can swap in at runtime
    pub fn pot_settings(&self) -> PotSettings {
        PotSettings {
            coffee_type: self.coffee_type.clone(),
            brew_time_sec: self.brew_time_sec,
            max_pour_time_sec: self.max_pour_time_sec,
            brew_command: self.commands.brew_command.clone(),
            stop_pouring_command: self.commands.stop_pouring_command.clone(),
        }
    }
}

/// Default configuration path: next to the running executable
pub fn default_config_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to retrieve executable's path")?;
    let dir = exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Where the dispatcher reloads pot settings from
///
/// `load` is called from the blocking thread pool and may do file I/O.
pub trait SettingsSource: Send + Sync {
    fn load(&self) -> Result<PotSettings>;
}

/// Settings re-read from the configuration file on every call
#[derive(Debug, Clone)]
pub struct FileSettingsSource {
    path: PathBuf,
}

impl FileSettingsSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsSource for FileSettingsSource {
    fn load(&self) -> Result<PotSettings> {
        if !self.path.exists() {
            anyhow::bail!("Configuration file {} is missing", self.path.display());
        }
        Ok(PotConfig::load(&self.path)?.pot_settings())
    }
}
