// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! CSV output configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::recorder::DEFAULT_FILE_PREFIX;

/// Where hourly CSV files are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the CSV files, created on first write if missing.
    pub directory: PathBuf,

    /// File name prefix, files are named `<prefix>_<YYYY>-<MM>-<DD>_<HH>.csv`.
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}
