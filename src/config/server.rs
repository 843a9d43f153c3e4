// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! OPC UA server connection configuration
//!
//! This module defines where the logger connects and which part of the
//! address space it auto-discovers.

use serde::{Deserialize, Serialize};

/// Endpoint of the Prosys-style simulation server the logger targets by default.
pub const DEFAULT_ENDPOINT: &str = "opc.tcp://localhost:53530/OPCUA/SimulationServer";

/// Folder under `Objects` whose children become tags.
pub const DEFAULT_FOLDER: &str = "Simulation";

/// Number of tag columns written to every row.
pub const DEFAULT_TAG_COUNT: usize = 10;

/// Configuration of the OPC UA server session.
///
/// # Fields
///
/// * `endpoint` - `opc.tcp://` URL of the server
/// * `folder` - display name of the folder under `Objects` to auto-discover
/// * `tag_count` - exact number of tags; folder children are repeated or
///   truncated to reach it
///
/// # Example
///
/// ```
/// use rust_opcua_logger::config::ServerConfig;
///
/// let server = ServerConfig {
///     endpoint: "opc.tcp://plc-7:4840".to_string(),
///     folder: "Line7".to_string(),
///     tag_count: 4,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The `opc.tcp://` endpoint URL.
    pub endpoint: String,

    /// Display name of the discovered folder.
    pub folder: String,

    /// Number of tags logged per row. Must be at least 1.
    pub tag_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            folder: DEFAULT_FOLDER.to_string(),
            tag_count: DEFAULT_TAG_COUNT,
        }
    }
}
