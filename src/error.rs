// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Logger error taxonomy
//!
//! - configuration errors (`FolderNotFound`, `EmptyFolder`) end the current
//!   session attempt and are retried by the reconnect loop
//! - session errors end the sampling loop and trigger a reconnect
//! - output errors (CSV file I/O) are handled like session errors
//! - `RetriesExhausted` is only produced by a bounded retry policy
//!
//! Single value read failures never show up here: the sampler records them as
//! empty CSV fields.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("{0} folder not found under Objects")]
    FolderNotFound(String),

    #[error("No nodes found under {0}")]
    EmptyFolder(String),

    #[error("Session error: {0}")]
    Session(#[from] ClientError),

    #[error("Failed to write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Giving up after {attempts} consecutive failures")]
    RetriesExhausted { attempts: u32 },
}

impl LoggerError {
    /// Whether the error comes from the server address space not matching
    /// what the logger expects.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::FolderNotFound(_) | LoggerError::EmptyFolder(_)
        )
    }

    pub(crate) fn output(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoggerError::Output {
            path: path.into(),
            source,
        }
    }
}
