/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("sessionID {0} does not exist")]
    UnknownSession(u64),
    #[error("session method panicked: {0}")]
    Panicked(String),
    #[error("oids length must be exactly 1")]
    WrongBindingCount,
    #[error("cannot call BULKWALK with SNMPv1")]
    UnsupportedVersion,
    #[error("session is closed")]
    SessionClosed,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Usm(#[from] UsmError),
    #[error("transport error: {0}")]
    Transport(#[from] snmp2::Error),
    #[error("SNMP request to {0} timed out")]
    Timeout(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to resolve hostname {0}: {1}")]
    Dns(String, trust_dns_resolver::error::ResolveError),
    #[error("failed to initialize resolver for hostname {0}: {1}")]
    DnsIo(String, trust_dns_resolver::error::ResolveError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("hostname {0} resolved to no addresses")]
    DnsEmpty(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown type; oid={oid}, type={type_tag}, value={value}")]
pub struct DecodeError {
    pub oid: String,
    pub type_tag: u8,
    pub value: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("SNMPv3 USM failure on {oid}: {message}")]
pub struct UsmError {
    pub oid: crate::oid::Oid,
    pub message: &'static str,
}
