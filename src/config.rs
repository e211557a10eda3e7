//! Input configuration
//!
//! Supports multiple profiles (debug, release) with different settings.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::settings::{DEFAULT_REPEAT_DELAY, DEFAULT_REPEAT_INTERVAL, Millis};

/// Environment variable naming the profile to load
pub const PROFILE_ENV: &str = "ARCADE_PROFILE";

const DEFAULT_PROFILE: &str = "release";

/// Picks the profile named by `value`, falling back to "release" when it is
/// unset or blank
pub fn profile_or_default(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
}

/// Repeat timing applied to buttons without per-instance overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatConfig {
    /// Milliseconds a button must be held before repeats start
    pub delay_ms: Millis,
    /// Milliseconds between repeat events
    pub interval_ms: Millis,
}

/// Event namespace configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Raise user-band keys (false raises the system band instead)
    pub user_enabled: bool,
}

/// Relay link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Forward bridged button events to the relay peer instead of raising locally
    pub enabled: bool,
}

/// Input configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    pub repeat: RepeatConfig,
    pub events: EventsConfig,
    pub relay: RelayConfig,
}

impl InputConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. Built-in defaults (500ms delay, 30ms interval, user events on)
    /// 2. config/{profile}.toml
    /// 3. Environment variables with prefix ARCADE_ (e.g., ARCADE_REPEAT__DELAY_MS=250)
    ///
    /// Config files are searched for next to the executable first, then in
    /// the current directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        let dir = Self::find_config_dir().unwrap_or_else(|| PathBuf::from("config"));
        Self::load_from(&dir, profile)
    }

    /// Loads a profile from an explicit config directory
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let profile_path = dir.join(profile);

        let config = Config::builder()
            .set_default("repeat.delay_ms", DEFAULT_REPEAT_DELAY)?
            .set_default("repeat.interval_ms", DEFAULT_REPEAT_INTERVAL)?
            .set_default("events.user_enabled", true)?
            .set_default("relay.enabled", false)?
            .add_source(File::from(profile_path.as_path()).required(false))
            // Use __ as separator for nested fields (e.g., ARCADE_RELAY__ENABLED)
            .add_source(
                Environment::with_prefix("ARCADE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override("profile", profile)?
            .build()?;

        config.try_deserialize()
    }

    /// Finds the config directory by searching in multiple locations
    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        None
    }

    /// Loads configuration using the ARCADE_PROFILE environment variable,
    /// defaulting to "release"
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Self::load(&profile_or_default(std::env::var(PROFILE_ENV).ok()))
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            repeat: RepeatConfig {
                delay_ms: DEFAULT_REPEAT_DELAY,
                interval_ms: DEFAULT_REPEAT_INTERVAL,
            },
            events: EventsConfig { user_enabled: true },
            relay: RelayConfig { enabled: false },
        }
    }
}
