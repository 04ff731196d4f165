//! Configuration management for ClipWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer defaults, a `clipwatch.toml` file, `CLIPWATCH_*`
//! environment variables, and CLI arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the HTTP intake server.
    pub server: ServerConfig,
    /// Configuration for alert persistence.
    pub storage: StorageConfig,
    /// Configuration for the contact registry.
    pub contacts: ContactsConfig,
    /// Configuration for SMS dispatch.
    pub sms: SmsConfig,
}

/// Configuration for the HTTP intake server.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// The address to bind the listener to.
    pub bind: String,
    /// The port to listen on.
    pub port: u16,
}

/// Configuration for alert persistence.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// The directory alert record files are written to.
    pub alerts_dir: PathBuf,
}

/// Configuration for the contact registry.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContactsConfig {
    /// The JSON file mapping device ids to guardian/police contacts.
    pub mapping_file: PathBuf,
}

/// Configuration for SMS dispatch. Credentials are not configured here;
/// they come from the `TWILIO_*` environment variables, and their absence
/// selects simulated delivery.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmsConfig {
    /// Upper bound on a single delivery attempt, in seconds.
    pub timeout_seconds: u64,
}

impl Config {
    /// Loads the configuration by layering sources: defaults, the TOML
    /// file, `CLIPWATCH_*` environment variables (double underscore for
    /// nesting, e.g. `CLIPWATCH_SERVER__PORT`), and CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("clipwatch.toml"));
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("CLIPWATCH_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 5000,
            },
            storage: StorageConfig {
                alerts_dir: PathBuf::from("alerts"),
            },
            contacts: ContactsConfig {
                mapping_file: PathBuf::from("mapping.json"),
            },
            sms: SmsConfig {
                timeout_seconds: 10,
            },
        }
    }
}
