use anyhow::{Context, Result};
use std::path::PathBuf;

/// Location of the optional config file.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Unable to determine user config directory")?;
    Ok(config_dir.join("derpkg").join("config.toml"))
}

/// Where `completions install` writes scripts by default.
pub fn completions_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("derpkg")
        .join("completions")
}
