// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust OPC UA logger library
//!
//! Samples the variables of one folder of an OPC UA server once per minute
//! and appends the readings to hourly CSV files.
//!
//! - [`client`]: the narrow session interface the logger consumes, plus an
//!   in-process simulated server
//! - [`discovery`]: turns a folder into the fixed list of logged tags
//! - [`recorder`]: hourly CSV files and row formatting
//! - [`sampler`]: the minute-aligned sampling loop of one session
//! - [`daemon`]: the reconnect loop and its background task
//! - [`config`]: YAML configuration with JSON schema validation

pub mod client;
pub mod config;
pub mod daemon;
pub mod discovery;
pub mod error;
pub mod recorder;
pub mod sampler;
pub mod shutdown;

pub use error::LoggerError;
