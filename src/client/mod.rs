// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! OPC UA client seam
//!
//! The logger never talks to a protocol stack directly. It consumes a server
//! through two traits:
//!
//! ```text
//!   OpcConnector::connect(endpoint)
//!           ↓
//!   OpcSession ── objects_folder / browse_children / display_name
//!              ── read_value / disconnect
//! ```
//!
//! A [`NodeId`] is both the node handle and its printable identifier.
//!
//! [`UaTcpConnector`] talks to real servers over `opc.tcp://`.
//! [`SimulationConnector`] is an in-process address space that mirrors the
//! `Simulation` folder of common OPC UA simulation servers.

mod simulation;
mod types;
mod uatcp;

pub use simulation::{SimulatedSession, SimulationConnector, SIMULATION_FOLDER};
pub use types::{Identifier, NodeId, Variant};
pub use uatcp::{UaTcpConnector, UaTcpSession};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a client backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint '{0}': expected an opc.tcp:// URL")]
    InvalidEndpoint(String),

    #[error("connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("bad status for node {node}: {status}")]
    BadStatus { node: NodeId, status: String },

    #[error("session is closed")]
    SessionClosed,

    #[error("invalid node id '{0}'")]
    InvalidNodeId(String),

    #[error("communication with the server failed: {status}")]
    Communication { status: String },
}

impl ClientError {
    /// Whether the error means the whole session is unusable.
    ///
    /// Node level failures (unknown node, bad status) only affect a single
    /// value and are recovered by the sampler.
    pub fn is_session_fault(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionFailed { .. }
                | ClientError::SessionClosed
                | ClientError::Communication { .. }
        )
    }
}

/// An open session to an OPC UA server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpcSession: Send {
    /// Root `Objects` container of the address space.
    fn objects_folder(&self) -> NodeId {
        NodeId::OBJECTS_FOLDER
    }

    /// Immediate children of `node`, in server order.
    async fn browse_children(&mut self, node: &NodeId) -> Result<Vec<NodeId>, ClientError>;

    /// Display name text of `node`.
    async fn display_name(&mut self, node: &NodeId) -> Result<String, ClientError>;

    /// Current value of `node`.
    async fn read_value(&mut self, node: &NodeId) -> Result<Variant, ClientError>;

    /// Close the session. Further calls fail with [`ClientError::SessionClosed`].
    async fn disconnect(&mut self) -> Result<(), ClientError>;
}

/// Opens sessions against an endpoint.
#[async_trait]
pub trait OpcConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn OpcSession>, ClientError>;
}

/// Check that `endpoint` looks like `opc.tcp://host[:port][/path]`.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ClientError> {
    let host = endpoint
        .strip_prefix("opc.tcp://")
        .map(|rest| rest.split(['/', ':']).next().unwrap_or_default())
        .unwrap_or_default();

    if host.is_empty() {
        return Err(ClientError::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(())
}
