//! Application configuration for composefn.
//!
//! User config lives at `~/.composefn/composefn.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ComposeFnError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "composefn.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".composefn";

/// Default TTL for which a response can be cached.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Config structs (matching composefn.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Response cache TTL in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Pretty-print emitted JSON.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            pretty: default_true(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}
fn default_true() -> bool {
    true
}

impl AppConfig {
    /// The configured response TTL.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.defaults.ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.composefn/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ComposeFnError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.composefn/composefn.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ComposeFnError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ComposeFnError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ComposeFnError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ComposeFnError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ComposeFnError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
