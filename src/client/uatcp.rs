// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! OPC UA binary (`opc.tcp://`) backend
//!
//! Sessions are opened without security (`SecurityPolicy::None`) and with an
//! anonymous identity, like the classic logger. Browsing follows forward
//! hierarchical references, names come from the `DisplayName` attribute and
//! values from the `Value` attribute.
//!
//! Service level status codes that mean the connection or the session is gone
//! are reported as [`ClientError::Communication`], a session fault. Any other
//! bad status only concerns the node and becomes [`ClientError::BadStatus`].

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use opcua::client::{ClientBuilder, IdentityToken, Session};
use opcua::crypto::SecurityPolicy;
use opcua::types::{
    AttributeId, BrowseDescription, BrowseDirection, ByteString, DataValue, Guid,
    Identifier as UaIdentifier, MessageSecurityMode, NodeId as UaNodeId, ReadValueId,
    ReferenceTypeId, StatusCode, TimestampsToReturn, UAString, UserTokenPolicy,
    Variant as UaVariant,
};
use tokio::task::JoinHandle;

use super::{validate_endpoint, ClientError, Identifier, NodeId, OpcConnector, OpcSession, Variant};

const APPLICATION_NAME: &str = "rust-opcua-logger";
const APPLICATION_URI: &str = "urn:rust-opcua-logger";
const DEFAULT_PKI_DIR: &str = "pki";

/// Every field of the reference descriptions.
const BROWSE_RESULT_ALL: u32 = 0x3f;

const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Status codes meaning the session can no longer serve requests.
const SESSION_FAULTS: [StatusCode; 10] = [
    StatusCode::BadNotConnected,
    StatusCode::BadConnectionClosed,
    StatusCode::BadCommunicationError,
    StatusCode::BadTimeout,
    StatusCode::BadServerNotConnected,
    StatusCode::BadSessionClosed,
    StatusCode::BadSessionIdInvalid,
    StatusCode::BadSessionNotActivated,
    StatusCode::BadSecureChannelClosed,
    StatusCode::BadSecureChannelIdInvalid,
];

/// Connector for real servers reachable over `opc.tcp://`.
#[derive(Debug, Clone)]
pub struct UaTcpConnector {
    pki_dir: PathBuf,
}

impl Default for UaTcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl UaTcpConnector {
    pub fn new() -> Self {
        Self {
            pki_dir: PathBuf::from(DEFAULT_PKI_DIR),
        }
    }

    /// Directory holding the client certificate store.
    pub fn with_pki_dir(mut self, pki_dir: impl Into<PathBuf>) -> Self {
        self.pki_dir = pki_dir.into();
        self
    }
}

#[async_trait]
impl OpcConnector for UaTcpConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn OpcSession>, ClientError> {
        validate_endpoint(endpoint)?;
        let failed = |reason: String| ClientError::ConnectionFailed {
            endpoint: endpoint.to_string(),
            reason,
        };

        let mut client = ClientBuilder::new()
            .application_name(APPLICATION_NAME)
            .application_uri(APPLICATION_URI)
            .product_uri(APPLICATION_URI)
            .pki_dir(&self.pki_dir)
            .trust_server_certs(true)
            .create_sample_keypair(true)
            .session_retry_limit(0)
            .client()
            .map_err(|errors| failed(errors.join("; ")))?;

        let (session, event_loop) = client
            .connect_to_matching_endpoint(
                (
                    endpoint,
                    SecurityPolicy::None.to_str(),
                    MessageSecurityMode::None,
                    UserTokenPolicy::anonymous(),
                ),
                IdentityToken::Anonymous,
            )
            .await
            .map_err(|status| failed(status.to_string()))?;

        let event_loop = event_loop.spawn();
        if !session.wait_for_connection().await {
            event_loop.abort();
            return Err(failed("session was not activated".to_string()));
        }
        info!("OPC UA session open on {}", endpoint);

        Ok(Box::new(UaTcpSession {
            session,
            event_loop: Some(event_loop),
        }))
    }
}

/// Session on a real server.
pub struct UaTcpSession {
    session: Arc<Session>,
    event_loop: Option<JoinHandle<StatusCode>>,
}

impl UaTcpSession {
    fn check_open(&self) -> Result<(), ClientError> {
        if self.event_loop.is_some() {
            Ok(())
        } else {
            Err(ClientError::SessionClosed)
        }
    }

    async fn read_attribute(
        &mut self,
        node: &NodeId,
        attribute: AttributeId,
    ) -> Result<UaVariant, ClientError> {
        self.check_open()?;
        let request = ReadValueId {
            node_id: to_ua_node_id(node)?,
            attribute_id: attribute as u32,
            ..Default::default()
        };

        let mut results = self
            .session
            .read(&[request], TimestampsToReturn::Neither, 0.0)
            .await
            .map_err(|status| service_error(node, status))?;
        let data = results.pop().ok_or_else(|| ClientError::BadStatus {
            node: node.clone(),
            status: "empty read response".to_string(),
        })?;
        value_of(node, data)
    }
}

#[async_trait]
impl OpcSession for UaTcpSession {
    async fn browse_children(&mut self, node: &NodeId) -> Result<Vec<NodeId>, ClientError> {
        self.check_open()?;
        let description = BrowseDescription {
            node_id: to_ua_node_id(node)?,
            browse_direction: BrowseDirection::Forward,
            reference_type_id: ReferenceTypeId::HierarchicalReferences.into(),
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: BROWSE_RESULT_ALL,
        };

        let mut results = self
            .session
            .browse(&[description], 0, None)
            .await
            .map_err(|status| service_error(node, status))?;

        let mut children = Vec::new();
        while let Some(result) = results.pop() {
            if result.status_code.is_bad() {
                return Err(node_error(node, result.status_code));
            }
            for reference in result.references.unwrap_or_default() {
                // references into other servers cannot be read through this session
                if reference.is_forward && reference.node_id.server_index == 0 {
                    children.push(from_ua_node_id(&reference.node_id.node_id));
                }
            }
            if result.continuation_point.is_null() {
                break;
            }
            results = self
                .session
                .browse_next(false, &[result.continuation_point])
                .await
                .map_err(|status| service_error(node, status))?;
        }
        Ok(children)
    }

    async fn display_name(&mut self, node: &NodeId) -> Result<String, ClientError> {
        match self.read_attribute(node, AttributeId::DisplayName).await? {
            UaVariant::LocalizedText(text) => Ok(text.text.value().clone().unwrap_or_default()),
            other => Err(ClientError::BadStatus {
                node: node.clone(),
                status: format!("unexpected DisplayName {:?}", other),
            }),
        }
    }

    async fn read_value(&mut self, node: &NodeId) -> Result<Variant, ClientError> {
        let value = self.read_attribute(node, AttributeId::Value).await?;
        to_variant(value).ok_or_else(|| ClientError::BadStatus {
            node: node.clone(),
            status: "empty value".to_string(),
        })
    }

    async fn disconnect(&mut self) -> Result<(), ClientError> {
        let Some(mut event_loop) = self.event_loop.take() else {
            return Err(ClientError::SessionClosed);
        };

        let result = self.session.disconnect().await;
        if tokio::time::timeout(DISCONNECT_TIMEOUT, &mut event_loop)
            .await
            .is_err()
        {
            warn!("OPC UA event loop did not stop, aborting it");
            event_loop.abort();
        }
        debug!("OPC UA session closed");

        result.map_err(|status| ClientError::Communication {
            status: status.to_string(),
        })
    }
}

impl Drop for UaTcpSession {
    fn drop(&mut self) {
        if let Some(event_loop) = self.event_loop.take() {
            event_loop.abort();
        }
    }
}

/// Error for a failed service call on behalf of `node`.
fn service_error(node: &NodeId, status: StatusCode) -> ClientError {
    if SESSION_FAULTS.contains(&status) {
        ClientError::Communication {
            status: status.to_string(),
        }
    } else {
        node_error(node, status)
    }
}

fn node_error(node: &NodeId, status: StatusCode) -> ClientError {
    ClientError::BadStatus {
        node: node.clone(),
        status: status.to_string(),
    }
}

fn value_of(node: &NodeId, data: DataValue) -> Result<UaVariant, ClientError> {
    if let Some(status) = data.status {
        if status.is_bad() {
            return Err(node_error(node, status));
        }
    }
    Ok(data.value.unwrap_or(UaVariant::Empty))
}

fn to_ua_node_id(node: &NodeId) -> Result<UaNodeId, ClientError> {
    let invalid = || ClientError::InvalidNodeId(node.to_string());
    let identifier = match &node.identifier {
        Identifier::Numeric(value) => UaIdentifier::Numeric(*value),
        Identifier::String(value) => UaIdentifier::String(UAString::from(value.as_str())),
        Identifier::Guid(value) => {
            UaIdentifier::Guid(Guid::from_str(value).map_err(|_| invalid())?)
        }
        Identifier::Opaque(value) => {
            UaIdentifier::ByteString(ByteString::from_base64(value).ok_or_else(invalid)?)
        }
    };
    Ok(UaNodeId {
        namespace: node.namespace,
        identifier,
    })
}

fn from_ua_node_id(node: &UaNodeId) -> NodeId {
    let identifier = match &node.identifier {
        UaIdentifier::Numeric(value) => Identifier::Numeric(*value),
        UaIdentifier::String(value) => Identifier::String(value.value().clone().unwrap_or_default()),
        UaIdentifier::Guid(value) => Identifier::Guid(value.to_string()),
        UaIdentifier::ByteString(value) => Identifier::Opaque(value.as_base64()),
    };
    NodeId {
        namespace: node.namespace,
        identifier,
    }
}

/// Logged form of a server value, `None` for an empty variant.
fn to_variant(value: UaVariant) -> Option<Variant> {
    let value = match value {
        UaVariant::Empty => return None,
        UaVariant::Boolean(v) => Variant::Boolean(v),
        UaVariant::SByte(v) => Variant::Int(i64::from(v)),
        UaVariant::Int16(v) => Variant::Int(i64::from(v)),
        UaVariant::Int32(v) => Variant::Int(i64::from(v)),
        UaVariant::Int64(v) => Variant::Int(v),
        UaVariant::Byte(v) => Variant::UInt(u64::from(v)),
        UaVariant::UInt16(v) => Variant::UInt(u64::from(v)),
        UaVariant::UInt32(v) => Variant::UInt(u64::from(v)),
        UaVariant::UInt64(v) => Variant::UInt(v),
        UaVariant::Float(v) => Variant::Float(v),
        UaVariant::Double(v) => Variant::Double(v),
        UaVariant::String(v) => Variant::String(v.value().clone().unwrap_or_default()),
        UaVariant::DateTime(v) => Variant::DateTime(v.as_chrono()),
        UaVariant::LocalizedText(v) => Variant::String(v.text.value().clone().unwrap_or_default()),
        other => Variant::String(format!("{:?}", other)),
    };
    Some(value)
}
