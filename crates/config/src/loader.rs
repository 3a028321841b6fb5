use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::BridgeConfig;

const CONFIG_FILENAME: &str = "tgbridge.toml";

/// Returns the user-global config directory (`~/.config/tgbridge/`).
fn project_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tgbridge").map(|d| d.config_dir().to_path_buf())
}

/// Path of the config file, whether or not it exists yet.
#[must_use]
pub fn config_path() -> PathBuf {
    project_config_dir()
        .map(|d| d.join(CONFIG_FILENAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

/// Returns the data directory used for the link database, identity cache,
/// and Telegram session state.
#[must_use]
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "tgbridge")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".tgbridge"))
}

/// Path of the Telegram session state file.
///
/// Holds the last confirmed update offset; deleted when the bot token is
/// rotated so a new session starts from a clean offset.
#[must_use]
pub fn session_path() -> PathBuf {
    data_dir().join("telegram.session")
}

/// Load the config from the given path, or defaults when it does not exist.
pub fn load_config_from(path: &Path) -> anyhow::Result<BridgeConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file found, using defaults");
        return Ok(BridgeConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(toml::from_str(&raw)?)
}

/// Load the config from the standard location.
///
/// Falls back to defaults (with a warning) when the file is unreadable, so a
/// corrupt config never prevents the CLI from running.
#[must_use]
pub fn load_config() -> BridgeConfig {
    let path = config_path();
    match load_config_from(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            BridgeConfig::default()
        },
    }
}

/// Serialize `config` to TOML and write it to the user-global config path.
///
/// Creates parent directories if needed. Returns the path written to.
pub fn save_config(config: &BridgeConfig) -> anyhow::Result<PathBuf> {
    let path = config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

/// Serialize `config` to TOML at an explicit path.
pub fn save_config_to(config: &BridgeConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}
