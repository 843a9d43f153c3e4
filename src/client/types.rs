// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Node identifiers and values exchanged with the server

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use super::ClientError;

/// Identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(u32),
    String(String),
    /// Canonical GUID text, `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
    Guid(String),
    /// Base64 text of an opaque identifier.
    Opaque(String),
}

/// Address of a node in the server address space.
///
/// The text form follows the usual OPC UA notation: `i=85`, `ns=3;i=1001`,
/// `ns=3;s=85/0:Simulation`. Namespace 0 is omitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl NodeId {
    /// Standard `Objects` folder of every OPC UA server.
    pub const OBJECTS_FOLDER: NodeId = NodeId {
        namespace: 0,
        identifier: Identifier::Numeric(85),
    };

    pub fn numeric(namespace: u16, value: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(value),
        }
    }

    pub fn string(namespace: u16, value: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(value.into()),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(value) => write!(f, "i={}", value),
            Identifier::String(value) => write!(f, "s={}", value),
            Identifier::Guid(value) => write!(f, "g={}", value),
            Identifier::Opaque(value) => write!(f, "b={}", value),
        }
    }
}

impl FromStr for NodeId {
    type Err = ClientError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ClientError::InvalidNodeId(text.to_string());

        let (namespace, rest) = match text.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, rest) = rest.split_once(';').ok_or_else(invalid)?;
                (ns.parse::<u16>().map_err(|_| invalid())?, rest)
            }
            None => (0, text),
        };

        if let Some(value) = rest.strip_prefix("i=") {
            let value = value.parse::<u32>().map_err(|_| invalid())?;
            Ok(NodeId::numeric(namespace, value))
        } else if let Some(value) = rest.strip_prefix("s=") {
            Ok(NodeId::string(namespace, value))
        } else if let Some(value) = rest.strip_prefix("g=").filter(|v| !v.is_empty()) {
            Ok(NodeId {
                namespace,
                identifier: Identifier::Guid(value.to_string()),
            })
        } else if let Some(value) = rest.strip_prefix("b=").filter(|v| !v.is_empty()) {
            Ok(NodeId {
                namespace,
                identifier: Identifier::Opaque(value.to_string()),
            })
        } else {
            Err(invalid())
        }
    }
}

/// Value read from a variable node.
///
/// The CSV rendering follows the classic logger output: `True`/`False`,
/// floats always carry a fractional part (`3.0`), date-times are RFC 3339.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Boolean(true) => f.write_str("True"),
            Variant::Boolean(false) => f.write_str("False"),
            Variant::Int(value) => write!(f, "{}", value),
            Variant::UInt(value) => write!(f, "{}", value),
            Variant::Float(value) if value.is_finite() => write!(f, "{:?}", value),
            Variant::Double(value) if value.is_finite() => write!(f, "{:?}", value),
            Variant::Float(value) => write_non_finite(f, f64::from(*value)),
            Variant::Double(value) => write_non_finite(f, *value),
            Variant::String(value) => f.write_str(value),
            Variant::DateTime(value) => {
                f.write_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

fn write_non_finite(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        f.write_str("nan")
    } else if value > 0.0 {
        f.write_str("inf")
    } else {
        f.write_str("-inf")
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Boolean(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Double(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_node_id_text_form() {
        assert_eq!(NodeId::OBJECTS_FOLDER.to_string(), "i=85");
        assert_eq!(NodeId::numeric(3, 1001).to_string(), "ns=3;i=1001");
        assert_eq!(
            NodeId::string(3, "85/0:Simulation").to_string(),
            "ns=3;s=85/0:Simulation"
        );
    }

    #[test]
    fn test_node_id_parse() {
        for text in ["i=85", "ns=3;i=1001", "ns=3;s=85/0:Simulation", "ns=2;s=a;b"] {
            let node: NodeId = text.parse().unwrap();
            assert_eq!(node.to_string(), text);
        }
        assert_eq!("ns=2;s=a;b".parse::<NodeId>().unwrap(), NodeId::string(2, "a;b"));

        let guid: NodeId = "ns=4;g=09087e75-8e5e-499b-954f-f2a9603db28a".parse().unwrap();
        assert_eq!(
            guid.identifier,
            Identifier::Guid("09087e75-8e5e-499b-954f-f2a9603db28a".to_string())
        );
        assert_eq!(
            "ns=1;b=M/RbKBsRVkePCePcx24oRA==".parse::<NodeId>().unwrap().to_string(),
            "ns=1;b=M/RbKBsRVkePCePcx24oRA=="
        );

        assert!("".parse::<NodeId>().is_err());
        assert!("ns=x;i=1".parse::<NodeId>().is_err());
        assert!("ns=1".parse::<NodeId>().is_err());
        assert!("x=1234".parse::<NodeId>().is_err());
        assert!("ns=1;g=".parse::<NodeId>().is_err());
        assert!("i=-4".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_variant_display() {
        assert_eq!(Variant::Boolean(true).to_string(), "True");
        assert_eq!(Variant::Boolean(false).to_string(), "False");
        assert_eq!(Variant::Int(-12).to_string(), "-12");
        assert_eq!(Variant::UInt(7).to_string(), "7");
        assert_eq!(Variant::Double(0.5).to_string(), "0.5");
        assert_eq!(Variant::Double(3.0).to_string(), "3.0");
        assert_eq!(Variant::Double(-0.25).to_string(), "-0.25");
        assert_eq!(Variant::Float(1.5).to_string(), "1.5");
        assert_eq!(Variant::Float(2.0).to_string(), "2.0");
        assert_eq!(Variant::Double(f64::NAN).to_string(), "nan");
        assert_eq!(Variant::Double(f64::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(Variant::from("Running").to_string(), "Running");

        let stamp = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        assert_eq!(
            Variant::DateTime(stamp).to_string(),
            "2025-03-14T15:09:26.000Z"
        );
    }
}
