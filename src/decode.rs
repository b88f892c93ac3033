/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use crate::error::DecodeError;
use crate::oid::Oid;

/// The wire-level ASN.1 BER type tag of a variable binding, abstracted away
/// from whatever concrete transport crate produced it. Keeping this as its
/// own small enum (rather than matching on `snmp2::Value` directly in the
/// decoder) is what lets `decode` be unit tested without a live agent or a
/// mock socket: `crate::transport` is the only module that knows how to turn
/// a `snmp2::Value` into a `(RawType, RawValue)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RawType {
    UnknownType = 0x00,
    Boolean = 0x01,
    Integer = 0x02,
    OctetString = 0x04,
    Null = 0x05,
    ObjectIdentifier = 0x06,
    IpAddress = 0x40,
    Counter32 = 0x41,
    Gauge32 = 0x42,
    TimeTicks = 0x43,
    Opaque = 0x44,
    NsapAddress = 0x45,
    Counter64 = 0x46,
    Uinteger32 = 0x47,
    OpaqueFloat = 0x78,
    OpaqueDouble = 0x79,
    NoSuchObject = 0x80,
    NoSuchInstance = 0x81,
    EndOfMibView = 0x82,
    EndOfContents = 0xff,
}

impl RawType {
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// The four type tags that end a walk, per the agent's own signalling
    /// rather than a transport-level error.
    pub fn is_walk_terminator(self) -> bool {
        matches!(
            self,
            RawType::NoSuchObject
                | RawType::NoSuchInstance
                | RawType::EndOfMibView
                | RawType::EndOfContents
        )
    }
}

/// A raw decoded payload, still tagged by the wire type it came with.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    None,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Bytes(Vec<u8>),
    Float(f32),
    Double(f64),
    Text(String),
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::None => write!(f, ""),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::UInt(n) => write!(f, "{n}"),
            RawValue::Int(n) => write!(f, "{n}"),
            RawValue::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            RawValue::Float(n) => write!(f, "{n}"),
            RawValue::Double(n) => write!(f, "{n}"),
            RawValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A single decoded variable binding, the uniform result type all SNMP
/// operations eventually produce. Exactly one payload is meaningful, picked
/// by which variant this is.
#[derive(Debug, Clone, PartialEq)]
pub enum SnmpResult {
    NoSuchInstance { oid: Oid },
    NoSuchObject { oid: Oid },
    EndOfMibView { oid: Oid },
    Bool { oid: Oid, value: bool },
    Int { oid: Oid, value: i64 },
    Float { oid: Oid, value: f64 },
    ByteArray { oid: Oid, value: Vec<u8> },
    String { oid: Oid, value: String },
}

impl SnmpResult {
    pub fn oid(&self) -> &Oid {
        match self {
            SnmpResult::NoSuchInstance { oid }
            | SnmpResult::NoSuchObject { oid }
            | SnmpResult::EndOfMibView { oid }
            | SnmpResult::Bool { oid, .. }
            | SnmpResult::Int { oid, .. }
            | SnmpResult::Float { oid, .. }
            | SnmpResult::ByteArray { oid, .. }
            | SnmpResult::String { oid, .. } => oid,
        }
    }

    pub fn type_str(&self) -> &'static str {
        match self {
            SnmpResult::NoSuchInstance { .. } => "noSuchInstance",
            SnmpResult::NoSuchObject { .. } => "noSuchObject",
            SnmpResult::EndOfMibView { .. } => "endOfMibView",
            SnmpResult::Bool { .. } => "bool",
            SnmpResult::Int { .. } => "int",
            SnmpResult::Float { .. } => "float",
            SnmpResult::ByteArray { .. } => "bytearray",
            SnmpResult::String { .. } => "string",
        }
    }

    pub fn is_walk_terminator(&self) -> bool {
        matches!(
            self,
            SnmpResult::NoSuchInstance { .. }
                | SnmpResult::NoSuchObject { .. }
                | SnmpResult::EndOfMibView { .. }
        )
    }
}

/// Map `(oid, type, value)` onto the uniform `SnmpResult` representation.
///
/// `Null`, `UnknownType` and `EndOfContents` all fold into `noSuchInstance`
/// alongside the real `NoSuchInstance` tag: this loses information and is
/// almost certainly a historical bug in the system this was adapted from,
/// but it is the observed, depended-upon behavior (see DESIGN.md).
pub fn build_result(raw_oid: &str, ty: RawType, value: RawValue) -> Result<SnmpResult, DecodeError> {
    let oid = match Oid::parse(raw_oid) {
        Ok(oid) => oid,
        Err(_) => return Err(decode_error(raw_oid, ty, value)),
    };
    match ty {
        RawType::Null | RawType::UnknownType | RawType::NoSuchInstance | RawType::EndOfContents => {
            Ok(SnmpResult::NoSuchInstance { oid })
        }
        RawType::NoSuchObject => Ok(SnmpResult::NoSuchObject { oid }),
        RawType::EndOfMibView => Ok(SnmpResult::EndOfMibView { oid }),
        RawType::Boolean => match value {
            RawValue::Bool(value) => Ok(SnmpResult::Bool { oid, value }),
            other => Err(decode_error(raw_oid, ty, other)),
        },
        RawType::Counter32 | RawType::Gauge32 | RawType::Uinteger32 => match value {
            RawValue::UInt(value) => Ok(SnmpResult::Int {
                oid,
                value: value as i64,
            }),
            other => Err(decode_error(raw_oid, ty, other)),
        },
        RawType::Counter64 => match value {
            RawValue::UInt(value) => Ok(SnmpResult::Int {
                oid,
                value: value as i64,
            }),
            other => Err(decode_error(raw_oid, ty, other)),
        },
        RawType::Integer | RawType::TimeTicks => match value {
            RawValue::Int(value) => Ok(SnmpResult::Int { oid, value }),
            RawValue::UInt(value) => Ok(SnmpResult::Int {
                oid,
                value: value as i64,
            }),
            other => Err(decode_error(raw_oid, ty, other)),
        },
        RawType::Opaque | RawType::OpaqueDouble => match value {
            RawValue::Double(value) => Ok(SnmpResult::Float { oid, value }),
            RawValue::Float(value) => Ok(SnmpResult::Float {
                oid,
                value: value as f64,
            }),
            other => Err(decode_error(raw_oid, ty, other)),
        },
        RawType::OpaqueFloat => match value {
            RawValue::Float(value) => Ok(SnmpResult::Float {
                oid,
                value: value as f64,
            }),
            other => Err(decode_error(raw_oid, ty, other)),
        },
        RawType::OctetString => match value {
            RawValue::Bytes(bytes) => Ok(SnmpResult::ByteArray { oid, value: bytes }),
            other => Err(decode_error(raw_oid, ty, other)),
        },
        RawType::ObjectIdentifier | RawType::IpAddress => match value {
            RawValue::Text(value) => Ok(SnmpResult::String { oid, value }),
            other => Err(decode_error(raw_oid, ty, other)),
        },
        RawType::NsapAddress => Err(decode_error(raw_oid, ty, value)),
    }
}

fn decode_error(raw_oid: &str, ty: RawType, value: RawValue) -> DecodeError {
    DecodeError {
        oid: raw_oid.to_string(),
        type_tag: ty.tag(),
        value: value.to_string(),
    }
}
