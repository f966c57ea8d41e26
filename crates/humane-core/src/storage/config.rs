//! TOML-based application configuration.
//!
//! Stores:
//! - The current session (signed-in user id, anonymous partition id)
//! - Tracker behavior (historical edit confirmation)
//! - Collapsed dashboard sections
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::habit::Category;

/// Id of the pseudo-user owning data recorded before sign-in.
pub const DEFAULT_ANONYMOUS_USER_ID: &str = "anonymous";

const CONFIG_FILE: &str = "config.toml";

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Signed-in user. `None` means the anonymous partition is active.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_anonymous_user_id")]
    pub anonymous_user_id: String,
}

/// Tracker behavior.
///
/// Weeks always start on Monday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Ask before cycling a cell older than yesterday.
    #[serde(default = "default_true")]
    pub confirm_historical_edits: bool,
}

/// UI state the core stores but does not interpret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub collapsed_sections: Vec<Category>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

fn default_true() -> bool {
    true
}
fn default_anonymous_user_id() -> String {
    DEFAULT_ANONYMOUS_USER_ID.into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            anonymous_user_id: default_anonymous_user_id(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            confirm_historical_edits: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    _ if value == "none" => serde_json::Value::Null,
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::String(_) | serde_json::Value::Null if value.is_empty() => {
                        return Err(invalid("value must not be empty".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the config file inside `dir`.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Load from the data directory or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&data_dir()?)
    }

    /// Load from `dir`, writing defaults when no file exists yet.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(dir)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&data_dir()?)
    }

    /// Persist to `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let path = Self::path_in(dir);
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }

    /// User whose partition is active: the signed-in user, or the anonymous one.
    pub fn active_user_id(&self) -> &str {
        self.session
            .user_id
            .as_deref()
            .unwrap_or(&self.session.anonymous_user_id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.user_id.is_some()
    }

    pub fn is_collapsed(&self, category: Category) -> bool {
        self.ui.collapsed_sections.contains(&category)
    }

    /// Flip a section's collapsed flag. Returns the new state.
    pub fn toggle_collapsed(&mut self, category: Category) -> bool {
        if let Some(pos) = self.ui.collapsed_sections.iter().position(|c| *c == category) {
            self.ui.collapsed_sections.remove(pos);
            false
        } else {
            self.ui.collapsed_sections.push(category);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.session.anonymous_user_id, "anonymous");
        assert!(parsed.tracker.confirm_historical_edits);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg: Config = toml::from_str("[session]\nuser_id = \"alice\"\n").unwrap();
        assert_eq!(cfg.session.user_id.as_deref(), Some("alice"));
        assert_eq!(cfg.session.anonymous_user_id, "anonymous");
        assert!(cfg.tracker.confirm_historical_edits);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("tracker.confirm_historical_edits").as_deref(), Some("true"));
        assert_eq!(cfg.get("session.anonymous_user_id").as_deref(), Some("anonymous"));
        assert_eq!(cfg.get("session.user_id").as_deref(), Some("null"));
        assert!(cfg.get("tracker.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_bool() {
        let mut cfg = Config::default();
        cfg.set("tracker.confirm_historical_edits", "false").unwrap();
        assert!(!cfg.tracker.confirm_historical_edits);
    }

    #[test]
    fn set_fills_optional_string() {
        let mut cfg = Config::default();
        cfg.set("session.user_id", "alice").unwrap();
        assert_eq!(cfg.active_user_id(), "alice");
        cfg.set("session.user_id", "none").unwrap();
        assert_eq!(cfg.active_user_id(), "anonymous");
    }

    #[test]
    fn set_parses_category_list() {
        let mut cfg = Config::default();
        cfg.set("ui.collapsed_sections", "[\"joy\", \"strength\"]").unwrap();
        assert!(cfg.is_collapsed(Category::Joy));
        assert!(!cfg.is_collapsed(Category::Mobility));
        assert!(cfg.set("ui.collapsed_sections", "[\"fitness\"]").is_err());
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("tracker.nonexistent", "1"),
            Err(crate::CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(cfg.set("tracker.confirm_historical_edits", "maybe").is_err());
        assert!(cfg.set("", "x").is_err());
    }

    #[test]
    fn toggle_collapsed_flips_state() {
        let mut cfg = Config::default();
        assert!(cfg.toggle_collapsed(Category::Balance));
        assert!(cfg.is_collapsed(Category::Balance));
        assert!(!cfg.toggle_collapsed(Category::Balance));
        assert!(!cfg.is_collapsed(Category::Balance));
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(Config::path_in(dir.path()).exists());

        let mut cfg = cfg;
        cfg.session.user_id = Some("bob".into());
        cfg.save_to(dir.path()).unwrap();
        assert_eq!(Config::load_from(dir.path()).unwrap().active_user_id(), "bob");
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Config::path_in(dir.path()), "session = 3").unwrap();
        assert!(matches!(
            Config::load_from(dir.path()),
            Err(crate::CoreError::Config(ConfigError::LoadFailed { .. }))
        ));
    }
}
