// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, RetryStrategy};
use crate::client::validate_endpoint;

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_opcua_logger --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema_str = include_str!("../../resources/config.schema.json");

    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;
    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validates the configuration against rules the JSON schema does not cover.
///
/// # Validation Rules
///
/// - **Endpoint**: must be an `opc.tcp://` URL with a host
/// - **Tag count**: at least one tag
/// - **Folder**: non-empty display name
/// - **File prefix**: non-empty, no path separators
/// - **Retry**: exponential multiplier >= 1.0 and `max_delay_secs >= delay_secs`,
///   `max_attempts` >= 1 when set
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    validate_endpoint(&config.server.endpoint).context("Invalid server endpoint")?;

    if config.server.tag_count == 0 {
        anyhow::bail!("tag_count must be at least 1");
    }

    if config.server.folder.trim().is_empty() {
        anyhow::bail!("Discovery folder name must not be empty");
    }

    let prefix = &config.output.file_prefix;
    if prefix.is_empty() {
        anyhow::bail!("Output file prefix must not be empty");
    }
    if prefix.contains(['/', '\\']) {
        anyhow::bail!("Output file prefix must not contain path separators: {}", prefix);
    }

    let retry = &config.retry;
    if retry.strategy == RetryStrategy::Exponential {
        if !(retry.multiplier >= 1.0) || !retry.multiplier.is_finite() {
            anyhow::bail!("Retry multiplier must be a finite number >= 1.0");
        }
        if retry.max_delay_secs < retry.delay_secs {
            anyhow::bail!(
                "Retry max_delay_secs ({}) is lower than delay_secs ({})",
                retry.max_delay_secs,
                retry.delay_secs
            );
        }
    }
    if retry.max_attempts == Some(0) {
        anyhow::bail!("Retry max_attempts must be at least 1 when set");
    }

    Ok(())
}
