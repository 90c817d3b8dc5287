//! SKU parsing and spec reconciliation for speccheck.
//!
//! - [`matcher`]: two-pass keyword matching against SKU strings
//! - [`sku`]: keyword tables, battery grades and the SKU parser
//! - [`reconcile`]: per-field comparison producing a [`MismatchReport`]
//! - [`config`]: the TOML configuration file
//!
//! [`MismatchReport`]: speccheck_model::MismatchReport

#![deny(unsafe_code)]

pub mod config;
pub mod matcher;
pub mod reconcile;
pub mod sku;

pub use config::{
    AppConfig, CONFIG_FILENAME, ConfigError, DatabaseConfig, SearchConfig, load_config,
    resolve_config_path,
};
pub use matcher::{match_keyword, occurs_as_token};
pub use reconcile::{compare_field, parse_percent, reconcile};
pub use sku::{BatteryGrade, KeywordTable, parse_sku};
