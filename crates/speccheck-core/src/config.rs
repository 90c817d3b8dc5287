//! Application configuration.
//!
//! The configuration file is TOML with two required tables:
//!
//! ```toml
//! [database]
//! host = "localhost"
//! user = "technician"
//! password = "secret"
//! database = "orders.db"
//!
//! [search]
//! cpu_keywords = "i3,i5,i7"
//! ram_keywords = "8GB,16GB"
//! ssd_keywords = "256SSD,512SSD,1TBSSD"
//! model_keywords = "T480,T490"
//! resolution_keywords = "1920x1080,1366x768"
//! windows_keywords = "W10,W11"
//! grade_keywords = "AGRADE,BGRADE,CGRADE"
//! ```
//!
//! Every key is mandatory; a missing file, table or key fails startup.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use speccheck_model::SpecField;

use crate::sku::{KeywordTable, split_keyword_list};

/// File name looked up next to the executable and in the config directory.
pub const CONFIG_FILENAME: &str = "speccheck.toml";

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "speccheck";
const APP_NAME: &str = "speccheck";

const REQUIRED_KEYS: &[(&str, &[&str])] = &[
    ("database", &["host", "user", "password", "database"]),
    (
        "search",
        &[
            "cpu_keywords",
            "ram_keywords",
            "ssd_keywords",
            "model_keywords",
            "resolution_keywords",
            "windows_keywords",
            "grade_keywords",
        ],
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing section: [{section}]")]
    MissingSection { section: &'static str },

    #[error("missing option: [{section}] {key}")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("option [{section}] {key} must be a string")]
    NotAString {
        section: &'static str,
        key: &'static str,
    },
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { .. } => format!(
                "No {CONFIG_FILENAME} was found. Place it next to the program or pass --config."
            ),
            Self::Io { path, .. } | Self::Toml { path, .. } => {
                format!("The configuration file {} could not be read.", path.display())
            }
            Self::MissingSection { section } => {
                format!("The configuration file has no [{section}] section.")
            }
            Self::MissingKey { section, key } | Self::NotAString { section, key } => {
                format!("The configuration option [{section}] {key} is missing or invalid.")
            }
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parsed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub search: SearchConfig,
}

/// Connection settings for the order database.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    /// Database name; for the bundled SQLite backend this is the file path.
    pub database: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

/// Comma-separated keyword lists, as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub cpu_keywords: String,
    pub ram_keywords: String,
    pub ssd_keywords: String,
    pub model_keywords: String,
    pub resolution_keywords: String,
    pub windows_keywords: String,
    pub grade_keywords: String,
}

impl SearchConfig {
    pub fn keyword_table(&self) -> KeywordTable {
        KeywordTable::new()
            .with_keywords(SpecField::Model, split_keyword_list(&self.model_keywords))
            .with_keywords(SpecField::Cpu, split_keyword_list(&self.cpu_keywords))
            .with_keywords(SpecField::Storage, split_keyword_list(&self.ssd_keywords))
            .with_keywords(SpecField::Memory, split_keyword_list(&self.ram_keywords))
            .with_keywords(
                SpecField::Resolution,
                split_keyword_list(&self.resolution_keywords),
            )
            .with_keywords(SpecField::OsEdition, split_keyword_list(&self.windows_keywords))
            .with_grades(split_keyword_list(&self.grade_keywords))
    }
}

impl AppConfig {
    /// Parse configuration text, checking every required table and key.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let toml_error = |source: toml::de::Error| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        };
        let raw: toml::Table = toml::from_str(content).map_err(toml_error)?;
        for &(section, keys) in REQUIRED_KEYS {
            let table = raw
                .get(section)
                .and_then(toml::Value::as_table)
                .ok_or(ConfigError::MissingSection { section })?;
            for &key in keys {
                match table.get(key) {
                    None => return Err(ConfigError::MissingKey { section, key }),
                    Some(value) if !value.is_str() => {
                        return Err(ConfigError::NotAString { section, key });
                    }
                    Some(_) => {}
                }
            }
        }
        toml::from_str(content).map_err(toml_error)
    }

    pub fn keyword_table(&self) -> KeywordTable {
        self.search.keyword_table()
    }
}

/// Load configuration from `path`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                searched: vec![path.to_path_buf()],
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let config = AppConfig::from_toml_str(&content, path)?;
    tracing::info!(
        path = %path.display(),
        host = %config.database.host,
        database = %config.database.database,
        "loaded configuration"
    );
    Ok(config)
}

/// Locate the configuration file.
///
/// An explicit path is used as-is. Otherwise `speccheck.toml` is looked up
/// next to the executable, then in the platform configuration directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let candidates = default_config_candidates();
    match candidates.iter().position(|path| path.is_file()) {
        Some(index) => Ok(candidates[index].clone()),
        None => Err(ConfigError::NotFound {
            searched: candidates,
        }),
    }
}

fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(dir.join(CONFIG_FILENAME));
    }
    if let Some(dirs) = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME) {
        candidates.push(dirs.config_dir().join(CONFIG_FILENAME));
    }
    candidates
}
