/*!
 * Runtime Configuration
 *
 * Loaded once at startup from a JSON file and/or environment variables.
 * Every field has a documented default so an empty config is valid.
 */

use super::errors::ConfigError;
use super::limits::*;
use crate::permissions::TemporaryModifier;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Path of an optional JSON config file
pub const CONFIG_PATH_ENV: &str = "PERMS_CONFIG";

/// Process-wide configuration
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    /// Collision policy for re-granted temporary nodes (default: deny)
    pub temporary_modifier: TemporaryModifier,

    /// Expiry sweeper period in seconds (default: 3)
    #[serde_as(as = "DurationSeconds<u64>")]
    pub sweep_interval: Duration,

    /// Inheritance depth bound for cached view builds (default: 16)
    pub max_inheritance_depth: usize,

    /// Save attempts before a persistence failure is surfaced (default: 3)
    pub save_attempts: u32,

    /// Delay between save attempts in milliseconds (default: 100)
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub save_retry_delay: Duration,

    /// Groups every user inherits implicitly (default: ["default"])
    pub default_user_groups: Vec<String>,

    /// Groups every holder inherits implicitly (default: [])
    pub global_default_groups: Vec<String>,

    /// Options answered when no node in the inheritance tree sets them
    pub default_options: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            temporary_modifier: TemporaryModifier::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_inheritance_depth: DEFAULT_MAX_INHERITANCE_DEPTH,
            save_attempts: DEFAULT_SAVE_ATTEMPTS,
            save_retry_delay: DEFAULT_SAVE_RETRY_DELAY,
            default_user_groups: vec![DEFAULT_USER_GROUP.to_string()],
            global_default_groups: Vec::new(),
            default_options: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validated()
    }

    /// Load a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Build from `PERMS_CONFIG` (if set) overlaid with individual env vars
    ///
    /// Environment variables:
    /// - PERMS_CONFIG: path to a JSON config file
    /// - PERMS_TEMPORARY_MODIFIER: deny | replace | accumulate
    /// - PERMS_SWEEP_INTERVAL_SECS: sweeper period
    /// - PERMS_MAX_INHERITANCE_DEPTH: inheritance depth bound
    /// - PERMS_SAVE_ATTEMPTS: save attempts per mutation
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(value) = std::env::var("PERMS_TEMPORARY_MODIFIER") {
            config.temporary_modifier = value.parse()?;
        }
        if let Some(secs) = env_number::<u64>("PERMS_SWEEP_INTERVAL_SECS")? {
            config.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(depth) = env_number::<usize>("PERMS_MAX_INHERITANCE_DEPTH")? {
            config.max_inheritance_depth = depth;
        }
        if let Some(attempts) = env_number::<u32>("PERMS_SAVE_ATTEMPTS")? {
            config.save_attempts = attempts;
        }

        config.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        if self.max_inheritance_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_inheritance_depth".to_string(),
                value: "0".to_string(),
            });
        }
        if self.save_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "save_attempts".to_string(),
                value: "0".to_string(),
            });
        }
        if self.sweep_interval < MIN_SWEEP_INTERVAL {
            self.sweep_interval = MIN_SWEEP_INTERVAL;
        }
        Ok(self)
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
