//! Runtime settings: defaults, optionally a YAML file, then `SHELTER_*` environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dashboard::DEFAULT_READ_LIMIT;

pub const DEFAULT_BIND: &str = "127.0.0.1:8050";
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017/";
pub const DEFAULT_DATABASE: &str = "cs499";
pub const DEFAULT_COLLECTION: &str = "shelter_outcomes";
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const DEFAULT_LOGO: &str = "grazioso-logo.png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGO_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind: String,
    pub store: StoreConfig,
    /// Cap on records fetched per filter change; `0` reads everything.
    pub read_limit: usize,
    pub assets_dir: PathBuf,
    /// Logo file name inside `assets_dir`.
    pub logo: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            store: StoreConfig::default(),
            read_limit: DEFAULT_READ_LIMIT,
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            logo: DEFAULT_LOGO.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|key| env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Apply `SHELTER_*` overrides read through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("SHELTER_BIND") {
            self.bind = bind;
        }
        if let Some(uri) = lookup("SHELTER_MONGO_URI") {
            self.store.uri = uri;
        }
        if let Some(database) = lookup("SHELTER_DATABASE") {
            self.store.database = database;
        }
        if let Some(collection) = lookup("SHELTER_COLLECTION") {
            self.store.collection = collection;
        }
        if let Some(limit) = lookup("SHELTER_READ_LIMIT") {
            self.read_limit = limit
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "SHELTER_READ_LIMIT",
                    value: limit.clone(),
                })?;
        }
        if let Some(dir) = lookup("SHELTER_ASSETS_DIR") {
            self.assets_dir = PathBuf::from(dir);
        }
        if let Some(logo) = lookup("SHELTER_LOGO") {
            self.logo = logo;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_local_shelter_database() {
        let config = AppConfig::default();
        assert_eq!(config.store.uri, "mongodb://localhost:27017/");
        assert_eq!(config.store.database, "cs499");
        assert_eq!(config.store.collection, "shelter_outcomes");
        assert_eq!(config.read_limit, 100);
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.logo, "grazioso-logo.png");
    }

    #[test]
    fn yaml_fields_are_optional() {
        let config: AppConfig =
            serde_yaml::from_str("bind: 0.0.0.0:9000\nstore:\n  database: aac\n").unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.store.database, "aac");
        assert_eq!(config.store.collection, DEFAULT_COLLECTION);
    }

    #[test]
    fn environment_overrides_apply() {
        let config = AppConfig::default()
            .with_overrides(lookup(&[("SHELTER_READ_LIMIT", "0"), ("SHELTER_COLLECTION", "x")]))
            .unwrap();
        assert_eq!(config.read_limit, 0);
        assert_eq!(config.store.collection, "x");
    }

    #[test]
    fn invalid_read_limit_is_rejected() {
        let err = AppConfig::default()
            .with_overrides(lookup(&[("SHELTER_READ_LIMIT", "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "SHELTER_READ_LIMIT",
                ..
            }
        ));
    }
}
