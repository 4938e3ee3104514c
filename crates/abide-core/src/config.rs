//! TOML-based application configuration.
//!
//! Stores the local client's identity and storage location:
//! - `user_id`: the authenticated user identifier every operation is
//!   scoped to (absent until `auth login`)
//! - `database_file`: the store filename inside the data directory
//!
//! Configuration is stored at `~/.config/abide/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::store::data_dir;

fn default_database_file() -> String {
    "abide.db".to_string()
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/abide/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity all store operations are scoped to.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: None,
            database_file: default_database_file(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| CoreError::Config(e.to_string()))?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Absolute path of the store database.
    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(data_dir()?.join(&self.database_file))
    }

    /// Get a config value as a string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "user_id" => Some(
                self.user_id
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unset".to_string()),
            ),
            "database_file" => Some(self.database_file.clone()),
            _ => None,
        }
    }

    /// Set a config value by key. Returns an error for unknown keys or
    /// unparseable values. Does not save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "user_id" => {
                let id = Uuid::parse_str(value)
                    .map_err(|e| CoreError::Config(format!("invalid user_id: {e}")))?;
                self.user_id = Some(id);
            }
            "database_file" => self.database_file = value.to_string(),
            _ => return Err(CoreError::Config(format!("unknown config key: {key}"))),
        }
        Ok(())
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
        assert_eq!(parsed.user_id, None);
        assert_eq!(parsed.database_file, "abide.db");
    }

    #[test]
    fn set_user_id_accepts_uuid_only() {
        let mut cfg = Config::default();
        assert!(cfg.set("user_id", "not-a-uuid").is_err());
        let id = Uuid::new_v4();
        cfg.set("user_id", &id.to_string()).unwrap();
        assert_eq!(cfg.user_id, Some(id));
        assert_eq!(cfg.get("user_id"), Some(id.to_string()));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut cfg = Config::default();
        assert!(cfg.set("theme", "dark").is_err());
        assert!(cfg.get("theme").is_none());
    }
}
