/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! The one seam between this crate's session/walk logic and the wire: a
//! small async trait that `snmp2` is adapted to, and a scriptable mock
//! implementation of the same trait for deterministic tests.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use snmp2::v3::{Auth, Cipher, Security};
use snmp2::{AsyncSession, Oid as WireOid, Value};

use crate::config::{AuthProtocol, PrivacyProtocol, SecurityLevel, SessionParams, UsmParams};
use crate::decode::{RawType, RawValue};
use crate::error::{Error, Result};

/// One decoded variable binding as it comes off the wire, before it is
/// turned into a [`crate::decode::SnmpResult`].
pub struct Binding {
    pub oid: String,
    pub ty: RawType,
    pub value: RawValue,
}

#[async_trait]
pub trait SnmpTransport: Send + Sync {
    async fn get(&mut self, oid: &str) -> Result<Vec<Binding>>;
    async fn get_next(&mut self, oid: &str) -> Result<Vec<Binding>>;
    async fn get_bulk(
        &mut self,
        oid: &str,
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<Binding>>;
    async fn set(&mut self, oid: &str, value: RawValue) -> Result<Vec<Binding>>;
    async fn close(&mut self);

    /// Current retry count applied around each request. `walk_bulk` forces
    /// this to 0 for its duration so every GetBulk failure costs exactly one
    /// timeout, then restores it.
    fn retries(&self) -> u32;
    fn set_retries(&mut self, retries: u32);
}

/// Live transport backed by `snmp2::AsyncSession`. `AsyncSession` itself has
/// no notion of a request timeout or retry count (its constructors only take
/// the destination, credentials, and a starting request ID), so both are
/// applied around each call here: a `tokio::time::timeout` per attempt and a
/// manual resend loop on timeout or transport error.
pub struct Snmp2Transport {
    session: AsyncSession,
    timeout: Duration,
    retries: u32,
}

impl Snmp2Transport {
    pub async fn connect(addr: SocketAddr, params: &SessionParams) -> Result<Self> {
        let timeout = Duration::from_secs_f64(params.timeout_secs());
        let retries = params.retries() as u32;
        let session = match params {
            SessionParams::V1(p) => AsyncSession::new_v1(addr, p.community.as_bytes(), 0).await?,
            SessionParams::V2c(p) => {
                AsyncSession::new_v2c(addr, p.community.as_bytes(), 0).await?
            }
            SessionParams::V3(p) => {
                let security = build_security(p);
                AsyncSession::new_v3(addr, 0, security).await?
            }
        };
        Ok(Snmp2Transport {
            session,
            timeout,
            retries,
        })
    }

    fn wire_oid(oid: &str) -> Result<WireOid<'static>> {
        WireOid::from_str(oid)
            .map(|o| o.to_owned())
            .map_err(|_| Error::Decode(crate::error::DecodeError {
                oid: oid.to_string(),
                type_tag: 0,
                value: "invalid oid".to_string(),
            }))
    }

    fn bindings<'a>(varbinds: impl IntoIterator<Item = (WireOid<'a>, Value<'a>)>) -> Vec<Binding> {
        varbinds
            .into_iter()
            .map(|(oid, value)| {
                let (ty, raw) = split_value(value);
                Binding {
                    oid: oid.to_string(),
                    ty,
                    value: raw,
                }
            })
            .collect()
    }
}

fn build_security(p: &UsmParams) -> Security {
    let auth_protocol = match p.auth_protocol {
        AuthProtocol::NoAuth | AuthProtocol::Md5 => snmp2::v3::AuthProtocol::Md5,
        AuthProtocol::Sha => snmp2::v3::AuthProtocol::Sha1,
    };
    let auth = match p.security_level {
        SecurityLevel::NoAuthNoPriv => Auth::NoAuthNoPriv,
        SecurityLevel::AuthNoPriv => Auth::AuthNoPriv,
        SecurityLevel::AuthPriv => {
            let cipher = match p.privacy_protocol {
                PrivacyProtocol::Des => Cipher::Des,
                PrivacyProtocol::NoPriv | PrivacyProtocol::Aes => Cipher::Aes128,
            };
            Auth::AuthPriv {
                cipher,
                privacy_password: p.privacy_password.as_bytes().to_vec(),
            }
        }
    };
    Security::new(p.security_username.as_bytes(), p.auth_password.as_bytes())
        .with_auth(auth)
        .with_auth_protocol(auth_protocol)
}

fn split_value(value: Value<'_>) -> (RawType, RawValue) {
    match value {
        Value::Boolean(b) => (RawType::Boolean, RawValue::Bool(b)),
        Value::Integer(n) => (RawType::Integer, RawValue::Int(n)),
        Value::OctetString(bytes) => (RawType::OctetString, RawValue::Bytes(bytes.to_vec())),
        Value::Null => (RawType::Null, RawValue::None),
        Value::ObjectIdentifier(oid) => (RawType::ObjectIdentifier, RawValue::Text(oid.to_string())),
        Value::IpAddress(bytes) => (
            RawType::IpAddress,
            RawValue::Text(
                std::net::Ipv4Addr::from(bytes).to_string(),
            ),
        ),
        Value::Counter32(n) => (RawType::Counter32, RawValue::UInt(n as u64)),
        Value::Unsigned32(n) => (RawType::Gauge32, RawValue::UInt(n as u64)),
        Value::Timeticks(n) => (RawType::TimeTicks, RawValue::UInt(n as u64)),
        Value::Opaque(bytes) => (RawType::Opaque, RawValue::Bytes(bytes.to_vec())),
        Value::Counter64(n) => (RawType::Counter64, RawValue::UInt(n)),
        Value::NoSuchObject => (RawType::NoSuchObject, RawValue::None),
        Value::NoSuchInstance => (RawType::NoSuchInstance, RawValue::None),
        Value::EndOfMibView => (RawType::EndOfMibView, RawValue::None),
        _ => (RawType::UnknownType, RawValue::None),
    }
}

#[async_trait]
impl SnmpTransport for Snmp2Transport {
    async fn get(&mut self, oid: &str) -> Result<Vec<Binding>> {
        let wire_oid = Self::wire_oid(oid)?;
        let mut attempt = 0;
        loop {
            match tokio::time::timeout(self.timeout, self.session.get(&wire_oid)).await {
                Ok(Ok(response)) => return Ok(Self::bindings(response.varbinds)),
                Ok(Err(_)) | Err(_) if attempt < self.retries => attempt += 1,
                Ok(Err(e)) => return Err(Error::from(e)),
                Err(_) => return Err(Error::Timeout(oid.to_string())),
            }
        }
    }

    async fn get_next(&mut self, oid: &str) -> Result<Vec<Binding>> {
        let wire_oid = Self::wire_oid(oid)?;
        let mut attempt = 0;
        loop {
            match tokio::time::timeout(self.timeout, self.session.getnext(&wire_oid)).await {
                Ok(Ok(response)) => return Ok(Self::bindings(response.varbinds)),
                Ok(Err(_)) | Err(_) if attempt < self.retries => attempt += 1,
                Ok(Err(e)) => return Err(Error::from(e)),
                Err(_) => return Err(Error::Timeout(oid.to_string())),
            }
        }
    }

    async fn get_bulk(
        &mut self,
        oid: &str,
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<Binding>> {
        let wire_oid = Self::wire_oid(oid)?;
        let mut attempt = 0;
        loop {
            let oids = [&wire_oid];
            let call = self.session.getbulk(&oids, non_repeaters, max_repetitions);
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(response)) => return Ok(Self::bindings(response.varbinds)),
                Ok(Err(_)) | Err(_) if attempt < self.retries => attempt += 1,
                Ok(Err(e)) => return Err(Error::from(e)),
                Err(_) => return Err(Error::Timeout(oid.to_string())),
            }
        }
    }

    async fn set(&mut self, oid: &str, value: RawValue) -> Result<Vec<Binding>> {
        let wire_oid = Self::wire_oid(oid)?;
        let bytes: Vec<u8> = match &value {
            RawValue::Text(s) => s.clone().into_bytes(),
            RawValue::Bytes(b) => b.clone(),
            _ => Vec::new(),
        };

        let mut attempt = 0;
        loop {
            let wire_value = match &value {
                RawValue::Int(n) => Value::Integer(*n),
                RawValue::Text(_) | RawValue::Bytes(_) => Value::OctetString(&bytes),
                _ => Value::Null,
            };
            let values = [(&wire_oid, wire_value)];
            let call = self.session.set(&values);
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(response)) => return Ok(Self::bindings(response.varbinds)),
                Ok(Err(_)) | Err(_) if attempt < self.retries => attempt += 1,
                Ok(Err(e)) => return Err(Error::from(e)),
                Err(_) => return Err(Error::Timeout(oid.to_string())),
            }
        }
    }

    async fn close(&mut self) {}

    fn retries(&self) -> u32 {
        self.retries
    }

    fn set_retries(&mut self, retries: u32) {
        self.retries = retries;
    }
}

/// Scriptable transport used in unit tests for the session and walk engine.
/// Each call pops the next scripted response, so callers can exercise
/// specific sequences (e.g. a timeout, then success, then a walk terminator)
/// without a live agent.
#[derive(Default)]
pub struct MockTransport {
    pub responses: std::collections::VecDeque<Result<Vec<Binding>>>,
    pub calls: Vec<MockCall>,
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Get(String),
    GetNext(String),
    GetBulk(String, u32, u32),
    Set(String),
    Close,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&mut self, bindings: Vec<Binding>) {
        self.responses.push_back(Ok(bindings));
    }

    pub fn push_err(&mut self, err: Error) {
        self.responses.push_back(Err(err));
    }

    fn next(&mut self) -> Result<Vec<Binding>> {
        self.responses
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl SnmpTransport for MockTransport {
    async fn get(&mut self, oid: &str) -> Result<Vec<Binding>> {
        self.calls.push(MockCall::Get(oid.to_string()));
        self.next()
    }

    async fn get_next(&mut self, oid: &str) -> Result<Vec<Binding>> {
        self.calls.push(MockCall::GetNext(oid.to_string()));
        self.next()
    }

    async fn get_bulk(
        &mut self,
        oid: &str,
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<Binding>> {
        self.calls
            .push(MockCall::GetBulk(oid.to_string(), non_repeaters, max_repetitions));
        self.next()
    }

    async fn set(&mut self, oid: &str, _value: RawValue) -> Result<Vec<Binding>> {
        self.calls.push(MockCall::Set(oid.to_string()));
        self.next()
    }

    async fn close(&mut self) {
        self.calls.push(MockCall::Close);
    }

    fn retries(&self) -> u32 {
        self.retries
    }

    fn set_retries(&mut self, retries: u32) {
        self.retries = retries;
    }
}

pub fn binding(oid: &str, ty: RawType, value: RawValue) -> Binding {
    Binding {
        oid: oid.to_string(),
        ty,
        value,
    }
}
