mod config;
pub mod database;
pub mod migrations;
pub mod store;

pub use config::{Config, SessionConfig, TrackerConfig, UiConfig, DEFAULT_ANONYMOUS_USER_ID};
pub use database::SqliteStore;
pub use store::{EntryStore, HabitStore};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the data directory, creating it if needed.
///
/// `HUMANE_DATA_DIR` wins when set. Otherwise `~/.config/humane-tracker`,
/// or `~/.config/humane-tracker-dev` when `HUMANE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("HUMANE_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .ok_or_else(|| ConfigError::NoDataDir("home directory not found".into()))?
                .join(".config");
            let env = std::env::var("HUMANE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("humane-tracker-dev")
            } else {
                base_dir.join("humane-tracker")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
