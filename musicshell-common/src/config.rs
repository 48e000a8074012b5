//! Configuration file discovery and music folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the music folder
pub const MUSIC_FOLDER_ENV: &str = "MUSICSHELL_MUSIC_FOLDER";

/// Folder used when nothing else is configured and the platform has no
/// music directory
pub const FALLBACK_MUSIC_FOLDER: &str = "../MusicFiles";

/// Music folder resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Value from the TOML config file
/// 4. Platform music directory, then `../MusicFiles`
pub fn resolve_music_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_value: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        debug!("Music folder from command line: {}", path.display());
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            debug!("Music folder from {}: {}", env_var_name, path);
            return PathBuf::from(path);
        }
    }

    if let Some(path) = config_value {
        debug!("Music folder from config file: {}", path.display());
        return path.to_path_buf();
    }

    default_music_folder()
}

/// OS-dependent default music folder
pub fn default_music_folder() -> PathBuf {
    dirs::audio_dir().unwrap_or_else(|| PathBuf::from(FALLBACK_MUSIC_FOLDER))
}

/// Locate the default configuration file for the platform
///
/// Linux checks `~/.config/musicshell/config.toml` and then
/// `/etc/musicshell/config.toml`; other platforms only use the user config
/// directory.
pub fn default_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("musicshell").join("config.toml"));

    if let Some(path) = user_config.as_ref().filter(|p| p.exists()) {
        return Ok(path.clone());
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/musicshell/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    match user_config {
        Some(path) => Err(Error::Config(format!("Config file not found: {}", path.display()))),
        None => Err(Error::Config("Could not determine config directory".to_string())),
    }
}

/// Read and parse a TOML file into `T`
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
}
