//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Reflection checklist keys for evening claims
//! - Repair lookback window
//! - Daily audit cutoff time (read by the external trigger)
//! - GitHub repository used for commit verification
//!
//! Configuration is stored at `~/.config/vowkeep/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Reflection checklist configuration.
///
/// The keys are data, not logic: claims seed missing keys as unconfirmed
/// and carry unknown extension keys through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionConfig {
    #[serde(default = "default_reflection_keys")]
    pub keys: Vec<String>,
}

/// Breach repair configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// How many days back a breach stays repairable.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
}

/// Daily audit configuration.
///
/// The trigger mechanism is external; it reads the cutoff here to decide
/// when "the morning after" has arrived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_cutoff_hour")]
    pub cutoff_hour: u32,
    #[serde(default = "default_cutoff_minute")]
    pub cutoff_minute: u32,
    /// Enforce reflection completeness when completing claims.
    #[serde(default)]
    pub strict_claims: bool,
}

/// GitHub verification configuration. The token lives in the OS keyring,
/// not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/vowkeep/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reflection: ReflectionConfig,
    #[serde(default)]
    pub repair: RepairConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub github: GithubConfig,
}

// Default functions
fn default_reflection_keys() -> Vec<String> {
    ["kept_vow", "avoided", "inbox_zero", "task_zero", "guilt_zero"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_lookback_days() -> i64 {
    30
}
fn default_cutoff_hour() -> u32 {
    4
}
fn default_cutoff_minute() -> u32 {
    30
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            keys: default_reflection_keys(),
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            cutoff_hour: default_cutoff_hour(),
            cutoff_minute: default_cutoff_minute(),
            strict_claims: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reflection: ReflectionConfig::default(),
            repair: RepairConfig::default(),
            audit: AuditConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

impl Config {
    /// Path of the config file.
    pub fn path() -> std::io::Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration from disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/vowkeep/config.toml"),
            message: e.to_string(),
        })?;
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::LoadFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load the configuration, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save the configuration to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::from("~/.config/vowkeep/config.toml"),
            message: e.to_string(),
        })?;
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, text).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Read a value by dotted path, e.g. `repair.lookback_days`.
    pub fn get(&self, key: &str) -> Option<String> {
        let root = serde_json::to_value(self).ok()?;
        let mut current = &root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(match current {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a value by dotted path. The new value must parse as the same JSON
    /// type the field already has.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut root = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;

        let mut parts = key.split('.').peekable();
        let mut current = &mut root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if !is_leaf {
                current = current
                    .as_object_mut()
                    .and_then(|obj| obj.get_mut(part))
                    .ok_or_else(|| invalid("unknown config key".to_string()))?;
                continue;
            }

            let slot = current
                .as_object_mut()
                .and_then(|obj| obj.get_mut(part))
                .ok_or_else(|| invalid("unknown config key".to_string()))?;
            {
                *slot = match slot {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value.parse::<i64>().map_err(|e| invalid(e.to_string()))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.to_string()),
                    serde_json::Value::Array(_) => serde_json::Value::Array(
                        value
                            .split(',')
                            .map(|s| serde_json::Value::String(s.trim().to_string()))
                            .collect(),
                    ),
                    _ => return Err(invalid("key is not settable".to_string())),
                };
            }
        }

        *self = serde_json::from_value(root).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_classic_checklist() {
        let config = Config::default();
        assert_eq!(
            config.reflection.keys,
            vec!["kept_vow", "avoided", "inbox_zero", "task_zero", "guilt_zero"]
        );
        assert_eq!(config.repair.lookback_days, 30);
        assert_eq!(config.audit.cutoff_hour, 4);
        assert!(!config.audit.strict_claims);
        assert!(config.github.owner.is_empty());
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let mut config = Config::default();
        config.repair.lookback_days = 14;
        config.github.owner = "octocat".into();
        config.github.repo = "daily-log".into();

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.repair.lookback_days, 14);
        assert_eq!(parsed.github.owner, "octocat");
        assert_eq!(parsed.github.repo, "daily-log");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[github]\nowner = \"octocat\"\n").unwrap();
        assert_eq!(parsed.github.owner, "octocat");
        assert_eq!(parsed.repair.lookback_days, 30);
        assert_eq!(parsed.reflection.keys.len(), 5);
    }

    #[test]
    fn get_reads_dotted_paths() {
        let config = Config::default();
        assert_eq!(config.get("repair.lookback_days").as_deref(), Some("30"));
        assert_eq!(config.get("audit.strict_claims").as_deref(), Some("false"));
        assert!(config.get("no.such.key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut config = Config::default();
        config.set("repair.lookback_days", "7").unwrap();
        assert_eq!(config.repair.lookback_days, 7);

        config.set("audit.strict_claims", "true").unwrap();
        assert!(config.audit.strict_claims);

        config.set("github.owner", "octocat").unwrap();
        assert_eq!(config.github.owner, "octocat");

        config
            .set("reflection.keys", "kept_vow, avoided")
            .unwrap();
        assert_eq!(config.reflection.keys, vec!["kept_vow", "avoided"]);

        assert!(config.set("repair.lookback_days", "soon").is_err());
        assert!(config.set("nonsense", "1").is_err());
    }
}
