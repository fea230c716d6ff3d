//! Configuration management for Sous
//!
//! Settings live in `~/.sous/config.json` with schema versioning and
//! migrations. The hands-free enabled flag and the timer list are session
//! state and are never written here.

use crate::timers::alarm::ALARM_TONE_HZ;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Global config instance for caching
static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations. Files written before versioning
    /// have no field and read as 0.
    #[serde(default)]
    pub version: u32,
    /// Voice control session settings
    pub handsfree: HandsfreeConfig,
    /// Speech output settings
    pub speech: SpeechConfig,
    /// Timer alarm settings
    pub alarm: AlarmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            handsfree: HandsfreeConfig::default(),
            speech: SpeechConfig::default(),
            alarm: AlarmConfig::default(),
        }
    }
}

/// Voice control session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandsfreeConfig {
    /// Delay before restarting recognition after it ends on its own
    pub restart_delay_ms: u64,
    /// Delay before listening again once speech output has finished,
    /// so the microphone does not pick up the tail of the speaker
    pub post_speech_delay_ms: u64,
    /// How long the last recognised command stays visible
    pub feedback_duration_ms: u64,
    /// Read out timer completions
    pub announce_timers: bool,
}

impl Default for HandsfreeConfig {
    fn default() -> Self {
        Self {
            restart_delay_ms: 300,
            post_speech_delay_ms: 500,
            feedback_duration_ms: 2000,
            announce_timers: true,
        }
    }
}

/// Speech output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Try the remote synthesis service before local speech
    pub remote_enabled: bool,
    /// Remote synthesis endpoint; receives `{"text", "voice"}` and returns audio
    pub remote_url: String,
    /// Voice identifier sent to the remote service
    pub voice: String,
    /// Remote request timeout in seconds
    pub timeout_secs: u64,
    /// Local text-to-speech command (text is passed as the last argument)
    pub local_command: String,
    /// Audio player command for remote audio (file path is the last argument)
    pub player_command: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            remote_enabled: false,
            remote_url: "http://localhost:5002/api/tts".to_string(),
            voice: "default".to_string(),
            timeout_secs: 10,
            local_command: default_local_command().to_string(),
            player_command: default_player_command().to_string(),
        }
    }
}

fn default_local_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak-ng"
    }
}

fn default_player_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "afplay"
    } else {
        "paplay"
    }
}

/// Timer alarm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// Whether to play the alarm tone
    pub play_sounds: bool,
    /// Whether to vibrate on devices that can
    pub vibrate: bool,
    /// Alarm tone frequency in Hz
    pub tone_hz: u32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            play_sounds: true,
            vibrate: true,
            tone_hz: ALARM_TONE_HZ,
        }
    }
}

/// Get the path to the config file (~/.sous/config.json)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.json")
}

/// Get the path to the config directory (~/.sous)
pub fn get_config_dir() -> PathBuf {
    home_dir_or_fallback().join(".sous")
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}

/// Load configuration from a file, falling back to defaults if it is missing
pub fn load_from_path(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        tracing::info!("Config file not found, using defaults");
        return Ok(Config::default());
    }

    let contents =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;

    let config: Config =
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse config: {}", e))?;

    let original_version = config.version;
    let migrated = migrate_config(config)?;
    if migrated.version != original_version {
        save_to_path(path, &migrated)?;
    }

    Ok(migrated)
}

/// Save configuration to a file, creating its directory if needed
pub fn save_to_path(path: &Path, config: &Config) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }
    }

    let contents = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialise config: {}", e))?;

    fs::write(path, contents).map_err(|e| format!("Failed to write config file: {}", e))?;

    tracing::info!("Config saved to {}", path.display());
    Ok(())
}

/// Migrate configuration from older schema versions
fn migrate_config(mut config: Config) -> Result<Config, String> {
    let original_version = config.version;

    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }

    if config.version > CURRENT_VERSION {
        return Err(format!("Unknown config version: {}", config.version));
    }

    if config.version != original_version {
        tracing::info!(
            "Migrated config from version {} to {}",
            original_version,
            config.version
        );
    }

    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, String> {
    match config.version {
        // Version 0 -> 1: unversioned files written before the schema field
        0 => {
            let mut migrated = config;
            migrated.version = 1;
            Ok(migrated)
        }
        v => Err(format!("Unknown config version: {}", v)),
    }
}

/// Get the global config instance
fn get_config_instance() -> &'static RwLock<Config> {
    CONFIG.get_or_init(|| {
        let config = load_from_path(&get_config_path()).unwrap_or_else(|e| {
            tracing::error!("Failed to load config, using defaults: {}", e);
            Config::default()
        });
        RwLock::new(config)
    })
}

/// Get the current configuration
///
/// The config is cached in memory and loaded from disk on first access.
pub fn get_config() -> Result<Config, String> {
    Ok(get_config_instance().read().clone())
}

/// Replace the current configuration and persist it to disk
pub fn set_config(mut config: Config) -> Result<(), String> {
    config.version = CURRENT_VERSION;
    save_to_path(&get_config_path(), &config)?;
    *get_config_instance().write() = config;
    Ok(())
}

/// Reset configuration to defaults and persist
pub fn reset_config() -> Result<Config, String> {
    let config = Config::default();
    set_config(config.clone())?;
    tracing::info!("Config reset to defaults");
    Ok(config)
}
