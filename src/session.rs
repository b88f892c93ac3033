/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::net::SocketAddr;

use log::trace;

use crate::config::SessionParams;
use crate::decode::{build_result, RawValue, SnmpResult};
use crate::dns::resolve;
use crate::error::{Error, Result};
use crate::marshal;
use crate::transport::{Snmp2Transport, SnmpTransport};
use crate::usm;
use crate::walk::{self, BulkWalkController};

/// One SNMP session: an owned transport plus the bookkeeping the spec's
/// operations need (connection state, the session's own bulk-walk
/// controller, and whether USM checks apply).
pub struct Session {
    params: SessionParams,
    transport: Option<Box<dyn SnmpTransport>>,
    connected: bool,
    controller: BulkWalkController,
    trace_prefix: String,
}

impl Session {
    pub fn new(params: SessionParams) -> Self {
        let trace_prefix = format!(
            "{}:{}:{}\t",
            version_tag(&params),
            params.host_name(),
            params.port()
        );
        Session {
            params,
            transport: None,
            connected: false,
            controller: BulkWalkController::new(),
            trace_prefix,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Idempotent: a second `connect()` on an already-connected session is
    /// a no-op success.
    pub async fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Ok(());
        }
        let ip = resolve(self.params.host_name()).await?;
        let addr = SocketAddr::new(ip, self.params.port());
        let transport = Snmp2Transport::connect(addr, &self.params).await?;
        trace!("{}connected", self.trace_prefix);
        self.transport = Some(Box::new(transport));
        self.connected = true;
        Ok(())
    }

    fn transport_mut(&mut self) -> Result<&mut dyn SnmpTransport> {
        match &mut self.transport {
            Some(t) if self.connected => Ok(t.as_mut()),
            _ => Err(Error::SessionClosed),
        }
    }

    pub async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        self.connected = false;
    }

    fn check_usm(&self, oid: &crate::oid::Oid, terminator: bool) -> Result<()> {
        if !self.params.is_v3() {
            return Ok(());
        }
        match usm::check(oid, terminator) {
            Some(err) => Err(Error::from(err)),
            None => Ok(()),
        }
    }

    fn decode_one(&self, bindings: Vec<crate::transport::Binding>) -> Result<SnmpResult> {
        let binding = bindings
            .into_iter()
            .next()
            .ok_or(Error::WrongBindingCount)?;
        trace!(
            "{}oid={} type={:?}",
            self.trace_prefix,
            binding.oid,
            binding.ty
        );
        let result = build_result(&binding.oid, binding.ty, binding.value)?;
        self.check_usm(result.oid(), result.is_walk_terminator())?;
        Ok(result)
    }

    pub async fn get(&mut self, oid: &str) -> Result<SnmpResult> {
        let bindings = self.transport_mut()?.get(oid).await?;
        self.decode_one(bindings)
    }

    pub async fn get_next(&mut self, oid: &str) -> Result<SnmpResult> {
        let bindings = self.transport_mut()?.get_next(oid).await?;
        if bindings.len() != 1 {
            return Err(Error::WrongBindingCount);
        }
        self.decode_one(bindings)
    }

    async fn set(&mut self, oid: &str, value: RawValue) -> Result<SnmpResult> {
        let bindings = self.transport_mut()?.set(oid, value).await?;
        self.decode_one(bindings)
    }

    pub async fn set_string(&mut self, oid: &str, value: &str) -> Result<SnmpResult> {
        self.set(oid, RawValue::Text(value.to_string())).await
    }

    pub async fn set_integer(&mut self, oid: &str, value: i64) -> Result<SnmpResult> {
        self.set(oid, RawValue::Int(value)).await
    }

    pub async fn set_ip_address(&mut self, oid: &str, value: &str) -> Result<SnmpResult> {
        self.set(oid, RawValue::Text(value.to_string())).await
    }

    pub async fn walk(&mut self, oid: &str) -> Result<Vec<SnmpResult>> {
        let transport = self.transport_mut()?;
        walk::walk(transport, oid).await
    }

    /// Adaptive bulk-walk. Rejects SNMPv1 (spec: bulk is not defined for
    /// that version). `walk::walk_bulk` forces the transport's retries to
    /// zero for its duration and restores them on every exit path, so each
    /// GetBulk attempt costs exactly one timeout and the controller's
    /// backoff sees every failure.
    pub async fn walk_bulk(&mut self, oid: &str) -> Result<Vec<SnmpResult>> {
        if self.params.is_v1() {
            return Err(Error::UnsupportedVersion);
        }
        let controller = &mut self.controller;
        let transport = match &mut self.transport {
            Some(t) if self.connected => t.as_mut(),
            _ => return Err(Error::SessionClosed),
        };
        walk::walk_bulk(transport, oid, controller).await
    }

    pub async fn get_json(&mut self, oid: &str) -> (String, Option<Error>) {
        to_json_pair(self.get(oid).await)
    }

    pub async fn get_next_json(&mut self, oid: &str) -> (String, Option<Error>) {
        to_json_pair(self.get_next(oid).await)
    }

    pub async fn set_string_json(&mut self, oid: &str, value: &str) -> (String, Option<Error>) {
        to_json_pair(self.set_string(oid, value).await)
    }

    pub async fn set_integer_json(&mut self, oid: &str, value: i64) -> (String, Option<Error>) {
        to_json_pair(self.set_integer(oid, value).await)
    }

    pub async fn set_ip_address_json(&mut self, oid: &str, value: &str) -> (String, Option<Error>) {
        to_json_pair(self.set_ip_address(oid, value).await)
    }

    pub async fn walk_json(&mut self, oid: &str) -> (Vec<String>, Option<Error>) {
        match self.walk(oid).await {
            Ok(results) => (results.iter().map(marshal::to_json).collect(), None),
            Err(e) => (Vec::new(), Some(e)),
        }
    }

    pub async fn walk_bulk_json(&mut self, oid: &str) -> (Vec<String>, Option<Error>) {
        match self.walk_bulk(oid).await {
            Ok(results) => (results.iter().map(marshal::to_json).collect(), None),
            Err(e) => (Vec::new(), Some(e)),
        }
    }
}

fn to_json_pair(result: Result<SnmpResult>) -> (String, Option<Error>) {
    match result {
        Ok(r) => (marshal::to_json(&r), None),
        Err(e) => (marshal::EMPTY.to_string(), Some(e)),
    }
}

fn version_tag(params: &SessionParams) -> &'static str {
    match params {
        SessionParams::V1(_) => "1",
        SessionParams::V2c(_) => "2c",
        SessionParams::V3(_) => "3",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommunityParams;
    use crate::decode::RawType;
    use crate::transport::{binding, MockTransport};

    fn v2c_session() -> Session {
        Session::new(SessionParams::V2c(CommunityParams::new(
            "localhost", 161, "public", 1.0, 0,
        )))
    }

    fn connected(mut session: Session, transport: MockTransport) -> Session {
        session.transport = Some(Box::new(transport));
        session.connected = true;
        session
    }

    #[tokio::test]
    async fn get_decodes_first_binding() {
        let mut mock = MockTransport::new();
        mock.push_ok(vec![binding("1.2.3", RawType::Integer, RawValue::Int(7))]);
        let mut session = connected(v2c_session(), mock);

        let result = session.get("1.2.3").await.unwrap();
        assert_eq!(result.type_str(), "int");
    }

    #[tokio::test]
    async fn get_next_rejects_multiple_bindings() {
        let mut mock = MockTransport::new();
        mock.push_ok(vec![
            binding("1.2.3", RawType::Integer, RawValue::Int(1)),
            binding("1.2.4", RawType::Integer, RawValue::Int(2)),
        ]);
        let mut session = connected(v2c_session(), mock);

        let err = session.get_next("1.2.3").await.unwrap_err();
        assert_eq!(err.to_string(), "oids length must be exactly 1");
    }

    #[tokio::test]
    async fn operations_on_closed_session_fail() {
        let mut session = v2c_session();
        let err = session.get("1.2.3").await.unwrap_err();
        assert_eq!(err.to_string(), "session is closed");
    }

    #[tokio::test]
    async fn bulk_walk_rejects_v1() {
        let mut session = Session::new(SessionParams::V1(CommunityParams::new(
            "localhost", 161, "public", 1.0, 0,
        )));
        session.connected = true;
        session.transport = Some(Box::new(MockTransport::new()));
        let err = session.walk_bulk("1.2.3").await.unwrap_err();
        assert_eq!(err.to_string(), "cannot call BULKWALK with SNMPv1");
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let mut session = v2c_session();
        session.connected = true;
        session.transport = Some(Box::new(MockTransport::new()));
        session.connect().await.unwrap();
        assert!(session.is_connected());
    }
}
