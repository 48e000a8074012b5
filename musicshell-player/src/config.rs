//! Configuration management for musicshell-player
//!
//! Settings come from, in priority order:
//! 1. Command-line arguments (--port, --music-folder, --provider)
//! 2. Environment variables (MUSICSHELL_*)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing configuration file is not an error: the player starts with
//! defaults and logs a warning.

use crate::error::{Error, Result};
use crate::provider::ProviderKind;
use musicshell_common::config::{default_config_file, load_toml, resolve_music_folder, MUSIC_FOLDER_ENV};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Settings read from the TOML file
///
/// Every field has a default so a partial file is valid.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Folder scanned by the local provider
    #[serde(default)]
    pub music_files_path: Option<PathBuf>,

    /// Which music provider backs the playlist
    #[serde(default)]
    pub music_provider: ProviderKind,

    /// File extensions picked up by the local provider
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Output device name (None = system default)
    #[serde(default)]
    pub device_name: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub timings: PlaybackTimings,

    #[serde(default)]
    pub spotify: SpotifyConfig,

    #[serde(default)]
    pub pandora: PandoraConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            music_files_path: None,
            music_provider: ProviderKind::default(),
            extensions: default_extensions(),
            device_name: None,
            logging: LoggingConfig::default(),
            timings: PlaybackTimings::default(),
            spotify: SpotifyConfig::default(),
            pandora: PandoraConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Lock and grace-period timings used by the playback controller
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct PlaybackTimings {
    /// Bounded wait for the transition lock in play/next/previous
    #[serde(default = "default_play_lock_timeout_ms")]
    pub play_lock_timeout_ms: u64,

    /// Bounded wait for the transition lock in stop
    #[serde(default = "default_stop_lock_timeout_ms")]
    pub stop_lock_timeout_ms: u64,

    /// Settle time after a natural completion before auto-advancing
    #[serde(default = "default_advance_grace_ms")]
    pub advance_grace_ms: u64,

    /// Bounded wait for the transition lock when auto-advancing
    #[serde(default = "default_advance_lock_timeout_ms")]
    pub advance_lock_timeout_ms: u64,
}

impl PlaybackTimings {
    pub fn play_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.play_lock_timeout_ms)
    }

    pub fn stop_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_lock_timeout_ms)
    }

    pub fn advance_grace(&self) -> Duration {
        Duration::from_millis(self.advance_grace_ms)
    }

    pub fn advance_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.advance_lock_timeout_ms)
    }
}

impl Default for PlaybackTimings {
    fn default() -> Self {
        Self {
            play_lock_timeout_ms: default_play_lock_timeout_ms(),
            stop_lock_timeout_ms: default_stop_lock_timeout_ms(),
            advance_grace_ms: default_advance_grace_ms(),
            advance_lock_timeout_ms: default_advance_lock_timeout_ms(),
        }
    }
}

/// Spotify credentials (provider not implemented yet)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
}

/// Pandora credentials (provider not implemented yet)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PandoraConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret: String,
}

fn default_port() -> u16 {
    5000
}

fn default_extensions() -> Vec<String> {
    vec!["mp3".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_play_lock_timeout_ms() -> u64 {
    2000
}

fn default_stop_lock_timeout_ms() -> u64 {
    1000
}

fn default_advance_grace_ms() -> u64 {
    200
}

fn default_advance_lock_timeout_ms() -> u64 {
    1000
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub music_folder: Option<PathBuf>,
    pub provider: Option<ProviderKind>,
    pub config_path: Option<PathBuf>,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub port: u16,
    /// Resolved music folder
    pub music_folder: PathBuf,
    pub provider: ProviderKind,
    pub extensions: Vec<String>,
    pub device_name: Option<String>,
    pub log_level: String,
    pub timings: PlaybackTimings,
    pub spotify: SpotifyConfig,
    pub pandora: PandoraConfig,
}

impl Config {
    /// Load configuration from the TOML file (explicit path or platform
    /// default) and apply command-line overrides
    ///
    /// An explicitly named file that cannot be read is an error; a missing
    /// default file only produces a warning.
    pub fn load(cli: CliOverrides) -> Result<Self> {
        let toml = match cli.config_path.as_deref() {
            Some(path) => Self::read_file(path)?,
            None => match default_config_file() {
                Ok(path) => Self::read_file(&path)?,
                Err(e) => {
                    warn!("{}; using built-in defaults", e);
                    TomlConfig::default()
                }
            },
        };

        Ok(Self::from_parts(toml, cli))
    }

    fn read_file(path: &Path) -> Result<TomlConfig> {
        info!("Loading configuration from {}", path.display());
        load_toml(path).map_err(|e| Error::Config(e.to_string()))
    }

    /// Merge file settings with command-line overrides
    pub fn from_parts(toml: TomlConfig, cli: CliOverrides) -> Self {
        let music_folder = resolve_music_folder(
            cli.music_folder.as_deref(),
            MUSIC_FOLDER_ENV,
            toml.music_files_path.as_deref(),
        );

        Self {
            port: cli.port.unwrap_or(toml.port),
            music_folder,
            provider: cli.provider.unwrap_or(toml.music_provider),
            extensions: toml.extensions,
            device_name: toml.device_name,
            log_level: toml.logging.level,
            timings: toml.timings,
            spotify: toml.spotify,
            pandora: toml.pandora,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let toml: TomlConfig = toml::from_str("").unwrap();

        assert_eq!(toml.port, 5000);
        assert_eq!(toml.music_provider, ProviderKind::Local);
        assert_eq!(toml.extensions, vec!["mp3".to_string()]);
        assert_eq!(toml.timings, PlaybackTimings::default());
        assert_eq!(toml.logging.level, "info");
    }

    #[test]
    fn test_timings_section() {
        let toml: TomlConfig = toml::from_str(
            r#"
            music_provider = "spotify"

            [timings]
            play_lock_timeout_ms = 500
            advance_grace_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(toml.music_provider, ProviderKind::Spotify);
        assert_eq!(toml.timings.play_lock_timeout(), Duration::from_millis(500));
        assert_eq!(toml.timings.advance_grace(), Duration::from_millis(50));
        // Unspecified values keep their defaults
        assert_eq!(toml.timings.stop_lock_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_cli_overrides_win() {
        let toml: TomlConfig = toml::from_str(
            r#"
            port = 6000
            music_files_path = "/srv/music"
            "#,
        )
        .unwrap();
        let cli = CliOverrides {
            port: Some(7000),
            music_folder: Some(PathBuf::from("/tmp/cli-music")),
            provider: Some(ProviderKind::Pandora),
            config_path: None,
        };

        let config = Config::from_parts(toml, cli);
        assert_eq!(config.port, 7000);
        assert_eq!(config.music_folder, PathBuf::from("/tmp/cli-music"));
        assert_eq!(config.provider, ProviderKind::Pandora);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result: std::result::Result<TomlConfig, _> = toml::from_str(r#"music_provider = "tidal""#);
        assert!(result.is_err());
    }
}
