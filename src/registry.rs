/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Process-wide table of live sessions, addressed by opaque handle.
//!
//! Every dispatch through the registry is wrapped in `catch_unwind`: a panic
//! inside the transport library (or a bug in this crate) is caught, logged
//! with the handle, and turned into an ordinary error rather than taking
//! down the host process — the Rust analogue of the `defer recover()`
//! boundary a dynamically-hosted binding needs around every call.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::{error, warn};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::config::SessionParams;
use crate::decode::SnmpResult;
use crate::error::{Error, Result};
use crate::session::Session;

type SharedSession = Arc<Mutex<Session>>;

#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<u64, SharedSession>,
    next_handle: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, params: SessionParams) -> u64 {
        let mut inner = self.inner.write();
        let handle = inner.next_handle;
        inner.next_handle += 1;
        inner
            .sessions
            .insert(handle, Arc::new(Mutex::new(Session::new(params))));
        handle
    }

    fn lookup(&self, handle: u64) -> Result<SharedSession> {
        self.inner
            .read()
            .sessions
            .get(&handle)
            .cloned()
            .ok_or(Error::UnknownSession(handle))
    }

    async fn dispatch<F, Fut, T>(&self, handle: u64, op: F) -> Result<T>
    where
        F: FnOnce(SharedSession) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = self.lookup(handle)?;
        match AssertUnwindSafe(op(session)).catch_unwind().await {
            Ok(r) => r,
            Err(payload) => {
                let message = panic_message(&payload);
                error!("session {handle} panicked: {message}");
                Err(Error::Panicked(message))
            }
        }
    }

    pub async fn connect(&self, handle: u64) -> Result<()> {
        self.dispatch(handle, |s| async move { s.lock().await.connect().await })
            .await
    }

    pub async fn get(&self, handle: u64, oid: &str) -> Result<SnmpResult> {
        let oid = oid.to_string();
        self.dispatch(handle, |s| async move { s.lock().await.get(&oid).await })
            .await
    }

    pub async fn get_next(&self, handle: u64, oid: &str) -> Result<SnmpResult> {
        let oid = oid.to_string();
        self.dispatch(handle, |s| async move { s.lock().await.get_next(&oid).await })
            .await
    }

    pub async fn set_string(&self, handle: u64, oid: &str, value: &str) -> Result<SnmpResult> {
        let (oid, value) = (oid.to_string(), value.to_string());
        self.dispatch(handle, |s| async move { s.lock().await.set_string(&oid, &value).await })
            .await
    }

    pub async fn set_integer(&self, handle: u64, oid: &str, value: i64) -> Result<SnmpResult> {
        let oid = oid.to_string();
        self.dispatch(handle, |s| async move { s.lock().await.set_integer(&oid, value).await })
            .await
    }

    pub async fn set_ip_address(&self, handle: u64, oid: &str, value: &str) -> Result<SnmpResult> {
        let (oid, value) = (oid.to_string(), value.to_string());
        self.dispatch(handle, |s| async move {
            s.lock().await.set_ip_address(&oid, &value).await
        })
        .await
    }

    pub async fn walk(&self, handle: u64, oid: &str) -> Result<Vec<SnmpResult>> {
        let oid = oid.to_string();
        self.dispatch(handle, |s| async move { s.lock().await.walk(&oid).await })
            .await
    }

    pub async fn walk_bulk(&self, handle: u64, oid: &str) -> Result<Vec<SnmpResult>> {
        let oid = oid.to_string();
        self.dispatch(handle, |s| async move { s.lock().await.walk_bulk(&oid).await })
            .await
    }

    /// Removes the handle from the map, then closes the session it pointed
    /// to. Removal happens first so a concurrent second close (or any
    /// racing operation) sees the handle as already gone. Closing an
    /// unknown handle is a no-op success.
    pub async fn close(&self, handle: u64) -> Result<()> {
        let session = self.inner.write().sessions.remove(&handle);
        match session {
            Some(session) => {
                session.lock().await.close().await;
                Ok(())
            }
            None => {
                warn!("close on unknown or already-closed session {handle}");
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommunityParams;

    fn params() -> SessionParams {
        SessionParams::V2c(CommunityParams::new("localhost", 161, "public", 1.0, 0))
    }

    #[tokio::test]
    async fn handles_are_assigned_monotonically() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.create(params()), 0);
        assert_eq!(registry.create(params()), 1);
    }

    #[tokio::test]
    async fn unknown_handle_reports_spec_error_string() {
        let registry = SessionRegistry::new();
        let err = registry.connect(42).await.unwrap_err();
        assert_eq!(err.to_string(), "sessionID 42 does not exist");
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let registry = SessionRegistry::new();
        let handle = registry.create(params());
        registry.close(handle).await.unwrap();
        registry.close(handle).await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn handles_are_never_reused_after_close() {
        let registry = SessionRegistry::new();
        let first = registry.create(params());
        registry.close(first).await.unwrap();
        let second = registry.create(params());
        assert_ne!(first, second);
        assert_eq!(second, 1);
    }
}
