// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Scripted in-memory OPC UA server shared by the integration tests
//!
//! Address space:
//!
//! ```text
//! Objects (i=85)
//! ├── Server (i=2253)
//! └── Plant (ns=2;s=Plant)
//!     ├── A (ns=2;i=1)
//!     ├── B (ns=2;i=2)
//!     └── C (ns=2;i=3)
//! ```

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rust_opcua_logger::client::{ClientError, NodeId, OpcConnector, OpcSession, Variant};
use rust_opcua_logger::shutdown::ShutdownTrigger;
use tokio::time::Instant;

pub const ENDPOINT: &str = "opc.tcp://fake-plc:4840";
pub const FOLDER: &str = "Plant";

#[derive(Default)]
pub struct FakeState {
    /// `false` refuses the next connection, an empty queue accepts.
    pub connect_script: VecDeque<bool>,
    /// Results of the next reads, an empty queue answers `Int(0)`.
    pub read_script: VecDeque<Result<Variant, ClientError>>,
    /// Fire the trigger once this many reads have been served.
    pub stop_after_reads: Option<usize>,
    pub trigger: Option<Arc<ShutdownTrigger>>,

    pub connects: Vec<Instant>,
    pub disconnects: usize,
    pub reads: usize,
}

#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<FakeState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn names() -> HashMap<NodeId, &'static str> {
        HashMap::from([
            (NodeId::OBJECTS_FOLDER, "Objects"),
            (NodeId::numeric(0, 2253), "Server"),
            (NodeId::string(2, "Plant"), "Plant"),
            (NodeId::numeric(2, 1), "A"),
            (NodeId::numeric(2, 2), "B"),
            (NodeId::numeric(2, 3), "C"),
        ])
    }
}

#[async_trait]
impl OpcConnector for FakeServer {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn OpcSession>, ClientError> {
        let mut state = self.state();
        state.connects.push(Instant::now());
        if state.connect_script.pop_front() == Some(false) {
            return Err(ClientError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(Box::new(FakeSession {
            server: self.clone(),
            open: true,
        }))
    }
}

pub struct FakeSession {
    server: FakeServer,
    open: bool,
}

impl FakeSession {
    fn check_open(&self) -> Result<(), ClientError> {
        if self.open {
            Ok(())
        } else {
            Err(ClientError::SessionClosed)
        }
    }
}

#[async_trait]
impl OpcSession for FakeSession {
    async fn browse_children(&mut self, node: &NodeId) -> Result<Vec<NodeId>, ClientError> {
        self.check_open()?;
        if *node == NodeId::OBJECTS_FOLDER {
            Ok(vec![NodeId::numeric(0, 2253), NodeId::string(2, "Plant")])
        } else if *node == NodeId::string(2, "Plant") {
            Ok((1..=3).map(|i| NodeId::numeric(2, i)).collect())
        } else {
            Ok(Vec::new())
        }
    }

    async fn display_name(&mut self, node: &NodeId) -> Result<String, ClientError> {
        self.check_open()?;
        FakeServer::names()
            .get(node)
            .map(|name| name.to_string())
            .ok_or_else(|| ClientError::NodeNotFound(node.clone()))
    }

    async fn read_value(&mut self, _node: &NodeId) -> Result<Variant, ClientError> {
        self.check_open()?;
        let mut state = self.server.state();
        state.reads += 1;
        let result = state.read_script.pop_front().unwrap_or(Ok(Variant::Int(0)));
        if state.stop_after_reads == Some(state.reads) {
            if let Some(trigger) = &state.trigger {
                trigger.trigger();
            }
        }
        result
    }

    async fn disconnect(&mut self) -> Result<(), ClientError> {
        self.check_open()?;
        self.open = false;
        self.server.state().disconnects += 1;
        Ok(())
    }
}

pub fn bad_status(id: u32) -> ClientError {
    ClientError::BadStatus {
        node: NodeId::numeric(2, id),
        status: "BadNotReadable".to_string(),
    }
}
