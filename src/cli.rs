//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. These arguments are parsed at startup and then merged
//! with the configuration from the `clipwatch.toml` file and environment
//! variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Alert intake and SMS dispatch service for wearable safety devices.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Port to serve the intake API on.
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Directory alert record files are written to.
    #[arg(long, value_name = "DIR")]
    pub alerts_dir: Option<PathBuf>,

    /// JSON file mapping device ids to guardian/police contacts.
    #[arg(long, value_name = "FILE")]
    pub mapping_file: Option<PathBuf>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(port) = self.port {
            let mut server = Dict::new();
            server.insert("port".into(), Value::from(port));
            dict.insert("server".into(), Value::from(server));
        }

        if let Some(dir) = &self.alerts_dir {
            let mut storage = Dict::new();
            storage.insert(
                "alerts_dir".into(),
                Value::from(dir.to_string_lossy().into_owned()),
            );
            dict.insert("storage".into(), Value::from(storage));
        }

        if let Some(file) = &self.mapping_file {
            let mut contacts = Dict::new();
            contacts.insert(
                "mapping_file".into(),
                Value::from(file.to_string_lossy().into_owned()),
            );
            dict.insert("contacts".into(), Value::from(contacts));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
