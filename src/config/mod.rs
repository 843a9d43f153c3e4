// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the OPC UA logger
//!
//! This module loads, validates and applies the logger settings. The
//! configuration is backed by a YAML file and validated against an embedded
//! JSON schema before being deserialized.
//!
//! ## Configuration Structure
//!
//! - `server`: endpoint, discovered folder and tag count
//! - `output`: directory and file prefix of the hourly CSV files
//! - `retry`: reconnect policy after a failure
//!
//! Every section is optional; missing values take the defaults, which match
//! the classic logger: `opc.tcp://localhost:53530/OPCUA/SimulationServer`,
//! folder `Simulation`, 10 tags, `OPC_Log_*.csv` in the working directory,
//! reconnect every 5 seconds forever.
//!
//! ## Usage
//!
//! ```no_run
//! use rust_opcua_logger::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("opc.tcp://10.0.0.12:4840".to_string()), // Endpoint
//!     Some(6),                                      // Tag count
//!     None,                                         // Folder
//!     Some("/var/log/opc".into()),                  // Output directory
//! );
//!
//! println!("Logging {} tags", config.server.tag_count);
//! ```

pub mod output;
pub mod retry;
pub mod server;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use output::OutputConfig;
pub use retry::{RetryConfig, RetryStrategy};
pub use server::ServerConfig;
pub use utils::{output_config_schema, validate_specific_rules};

/// Root configuration of the logger.
///
/// Deserialized from and serialized to YAML. The file is validated against
/// the JSON schema in `resources/config.schema.json` first, then checked
/// against the rules of [`validate_specific_rules`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OPC UA server and discovery settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Hourly CSV output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Reconnect policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default configuration. A file that
    /// fails validation produces a `<name>.sample.yaml` next to it and an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let config = match Self::from_yaml_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration error in {}: {:#}", path.display(), err);
                if let Err(sample_err) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {:#}", sample_err);
                }
                return Err(err.context(format!(
                    "Invalid configuration file {}",
                    path.display()
                )));
            }
        };

        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // YAML to a generic value, then to JSON for schema validation
        let yaml_value: serde_yml::Value =
            serde_yml::from_str(contents).context("Failed to parse YAML configuration")?;
        let json_value = serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?;

        let schema_str = include_str!("../../resources/config.schema.json");
        let schema: serde_json::Value =
            serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        // An empty document parses as null, which means "all defaults"
        if !json_value.is_null() {
            debug!("Validating configuration against schema");
            if let Err(error) = validator.validate(&json_value) {
                anyhow::bail!("Configuration validation failed: {}", error);
            }
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = if json_value.is_null() {
            Config::default()
        } else {
            serde_yml::from_str(contents).context("Failed to deserialize configuration")?
        };

        validate_specific_rules(&config)?;
        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only values explicitly provided override the existing configuration.
    ///
    /// # Parameters
    ///
    /// * `endpoint` - `opc.tcp://` URL of the server
    /// * `tag_count` - number of logged tags
    /// * `folder` - display name of the discovered folder
    /// * `output_dir` - directory receiving the CSV files
    pub fn apply_args(
        &mut self,
        endpoint: Option<String>,
        tag_count: Option<usize>,
        folder: Option<String>,
        output_dir: Option<PathBuf>,
    ) {
        if let Some(endpoint) = endpoint {
            debug!("Overriding endpoint from command line: {}", endpoint);
            self.server.endpoint = endpoint;
        }
        if let Some(count) = tag_count {
            debug!("Overriding tag count from command line: {}", count);
            self.server.tag_count = count;
        }
        if let Some(folder) = folder {
            debug!("Overriding folder from command line: {}", folder);
            self.server.folder = folder;
        }
        if let Some(dir) = output_dir {
            debug!("Overriding output directory from command line: {:?}", dir);
            self.output.directory = dir;
        }
    }
}
