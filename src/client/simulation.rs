// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated OPC UA server backend
//!
//! Provides an in-process address space shaped like the one exposed by common
//! OPC UA simulation servers:
//!
//! ```text
//! Objects (i=85)
//! ├── Server (i=2253)
//! └── Simulation (ns=3;s=85/0:Simulation)
//!     ├── Counter   (ns=3;i=1001)
//!     ├── Random    (ns=3;i=1002)
//!     ├── Sawtooth  (ns=3;i=1003)
//!     ├── Sinusoid  (ns=3;i=1004)
//!     ├── Square    (ns=3;i=1005)
//!     └── Triangle  (ns=3;i=1006)
//! ```
//!
//! Signal values are derived from the time elapsed since the connector was
//! created, so every session sees a continuous waveform.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use log::debug;
use rand::Rng;

use super::{validate_endpoint, ClientError, NodeId, OpcConnector, OpcSession, Variant};

/// Display name of the folder holding the simulated signals.
pub const SIMULATION_FOLDER: &str = "Simulation";

const NAMESPACE: u16 = 3;
const AMPLITUDE: f64 = 2.0;
const PERIOD_SECS: f64 = 10.0;
const COUNTER_LIMIT: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Signal {
    Counter,
    Random,
    Sawtooth,
    Sinusoid,
    Square,
    Triangle,
}

impl Signal {
    fn sample(self, elapsed_secs: f64) -> Variant {
        let phase = (elapsed_secs % PERIOD_SECS) / PERIOD_SECS;
        match self {
            Signal::Counter => Variant::Int((elapsed_secs as u64 % (COUNTER_LIMIT + 1)) as i64),
            Signal::Random => Variant::Double(rand::rng().random_range(-AMPLITUDE..AMPLITUDE)),
            Signal::Sawtooth => Variant::Double(-AMPLITUDE + 2.0 * AMPLITUDE * phase),
            Signal::Sinusoid => Variant::Double(AMPLITUDE * (2.0 * PI * phase).sin()),
            Signal::Square => Variant::Double(if phase < 0.5 { AMPLITUDE } else { -AMPLITUDE }),
            Signal::Triangle => {
                let rising = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
                Variant::Double(-AMPLITUDE + 2.0 * AMPLITUDE * rising)
            }
        }
    }
}

#[derive(Debug)]
struct SimNode {
    name: String,
    children: Vec<NodeId>,
    signal: Option<Signal>,
}

#[derive(Debug)]
struct AddressSpace {
    nodes: HashMap<NodeId, SimNode>,
    started: Instant,
}

impl AddressSpace {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        let folder = NodeId::string(NAMESPACE, "85/0:Simulation");
        let server = NodeId::numeric(0, 2253);

        let signals = [
            ("Counter", Signal::Counter),
            ("Random", Signal::Random),
            ("Sawtooth", Signal::Sawtooth),
            ("Sinusoid", Signal::Sinusoid),
            ("Square", Signal::Square),
            ("Triangle", Signal::Triangle),
        ];

        let mut folder_children = Vec::with_capacity(signals.len());
        for (offset, (name, signal)) in signals.into_iter().enumerate() {
            let id = NodeId::numeric(NAMESPACE, 1001 + offset as u32);
            folder_children.push(id.clone());
            nodes.insert(
                id,
                SimNode {
                    name: name.to_string(),
                    children: Vec::new(),
                    signal: Some(signal),
                },
            );
        }

        nodes.insert(
            NodeId::OBJECTS_FOLDER,
            SimNode {
                name: "Objects".to_string(),
                children: vec![server.clone(), folder.clone()],
                signal: None,
            },
        );
        nodes.insert(
            server,
            SimNode {
                name: "Server".to_string(),
                children: Vec::new(),
                signal: None,
            },
        );
        nodes.insert(
            folder,
            SimNode {
                name: SIMULATION_FOLDER.to_string(),
                children: folder_children,
                signal: None,
            },
        );

        Self {
            nodes,
            started: Instant::now(),
        }
    }

    fn node(&self, id: &NodeId) -> Result<&SimNode, ClientError> {
        self.nodes
            .get(id)
            .ok_or_else(|| ClientError::NodeNotFound(id.clone()))
    }
}

/// Connector for the in-process simulated server.
///
/// Accepts any well-formed `opc.tcp://` endpoint.
#[derive(Debug, Clone)]
pub struct SimulationConnector {
    space: Arc<AddressSpace>,
}

impl SimulationConnector {
    pub fn new() -> Self {
        Self {
            space: Arc::new(AddressSpace::new()),
        }
    }
}

impl Default for SimulationConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OpcConnector for SimulationConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn OpcSession>, ClientError> {
        validate_endpoint(endpoint)?;
        debug!("Opened simulated session on {}", endpoint);
        Ok(Box::new(SimulatedSession {
            space: Arc::clone(&self.space),
            open: true,
        }))
    }
}

/// Session on the simulated address space.
#[derive(Debug)]
pub struct SimulatedSession {
    space: Arc<AddressSpace>,
    open: bool,
}

impl SimulatedSession {
    fn space(&self) -> Result<&AddressSpace, ClientError> {
        if self.open {
            Ok(&self.space)
        } else {
            Err(ClientError::SessionClosed)
        }
    }
}

#[async_trait]
impl OpcSession for SimulatedSession {
    async fn browse_children(&mut self, node: &NodeId) -> Result<Vec<NodeId>, ClientError> {
        Ok(self.space()?.node(node)?.children.clone())
    }

    async fn display_name(&mut self, node: &NodeId) -> Result<String, ClientError> {
        Ok(self.space()?.node(node)?.name.clone())
    }

    async fn read_value(&mut self, node: &NodeId) -> Result<Variant, ClientError> {
        let space = self.space()?;
        let signal = space.node(node)?.signal.ok_or_else(|| ClientError::BadStatus {
            node: node.clone(),
            status: "BadAttributeIdInvalid".to_string(),
        })?;
        Ok(signal.sample(space.started.elapsed().as_secs_f64()))
    }

    async fn disconnect(&mut self) -> Result<(), ClientError> {
        if !self.open {
            return Err(ClientError::SessionClosed);
        }
        self.open = false;
        debug!("Closed simulated session");
        Ok(())
    }
}
