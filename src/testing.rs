//! Testing utilities: in-memory fakes for every external seam.
//!
//! These back the crate's own integration tests and are exported so
//! downstream code can exercise its UI logic without a relay, a directory,
//! or an identity provider.

use crate::alert::AlertSink;
use crate::auth::IdentityProvider;
use crate::directory::{DirectoryLookup, DirectoryUser};
use crate::error::{MeterviewError, Result};
use crate::relay::{Relay, RelayResponse, RelayTarget};
use crate::session::Principal;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Directory fake serving canned reporting lines, with an invocation
/// counter so tests can assert the lookup was (or wasn't) consulted.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    reports: HashMap<String, Vec<String>>,
    delay: Option<Duration>,
    lookups: AtomicUsize,
}

impl StaticDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reports(
        mut self,
        manager: impl Into<String>,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.reports
            .insert(manager.into(), names.into_iter().map(Into::into).collect());
        self
    }

    /// Delay every lookup, for watchdog tests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryLookup for StaticDirectory {
    async fn reports_for(&self, manager: &str) -> Result<Vec<DirectoryUser>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let names = self.reports.get(manager).cloned().unwrap_or_default();
        let json: Vec<Value> = names
            .into_iter()
            .map(|name| serde_json::json!({ "displayName": name }))
            .collect();
        Ok(serde_json::from_value(Value::Array(json))?)
    }
}

/// Directory fake that always fails.
#[derive(Debug, Default)]
pub struct FailingDirectory;

#[async_trait]
impl DirectoryLookup for FailingDirectory {
    async fn reports_for(&self, manager: &str) -> Result<Vec<DirectoryUser>> {
        Err(MeterviewError::Directory(format!(
            "no directory for {manager}"
        )))
    }
}

/// One recorded relay invocation.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub path: String,
    pub data: Option<Value>,
}

/// Relay fake answering from a path-keyed script and recording every call.
///
/// Unscripted paths answer `404`, which exercises the same failure path a
/// dead backend would.
#[derive(Debug, Default)]
pub struct ScriptedRelay {
    responses: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRelay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a 200 response for a backend path.
    #[must_use]
    pub fn respond(self, path: impl Into<String>, body: Value) -> Self {
        self.responses
            .lock()
            .expect("script lock")
            .insert(path.into(), body);
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("call lock").clone()
    }

    #[must_use]
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .expect("call lock")
            .iter()
            .filter(|call| call.path == path)
            .count()
    }
}

#[async_trait]
impl Relay for ScriptedRelay {
    async fn invoke(&self, target: RelayTarget, data: Option<Value>) -> Result<RelayResponse> {
        let path = target.path();
        self.calls.lock().expect("call lock").push(RecordedCall {
            path: path.clone(),
            data,
        });
        match self.responses.lock().expect("script lock").get(&path) {
            Some(body) => Ok(RelayResponse {
                status: 200,
                body: body.clone(),
            }),
            None => Err(MeterviewError::Relay {
                status: 404,
                message: format!("no script for {path}"),
            }),
        }
    }
}

/// Alert sink that captures messages for assertions.
#[derive(Debug, Default)]
pub struct CapturingAlerts {
    messages: Mutex<Vec<String>>,
}

impl CapturingAlerts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("alert lock").clone()
    }
}

impl AlertSink for CapturingAlerts {
    fn alert(&self, message: &str) {
        self.messages.lock().expect("alert lock").push(message.to_string());
    }
}

/// Identity provider fake that signs in a fixed principal.
#[derive(Clone, Debug)]
pub struct StaticIdentity {
    principal: Option<Principal>,
}

impl StaticIdentity {
    /// Provider that authenticates as the given name.
    #[must_use]
    pub fn signed_in(display_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            principal: Some(Principal {
                display_name: display_name.into(),
                access_token: token.into(),
            }),
        }
    }

    /// Provider whose interactive flow always gets rejected.
    #[must_use]
    pub fn rejecting() -> Self {
        Self { principal: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in(&self) -> Result<Principal> {
        self.principal
            .clone()
            .ok_or_else(|| MeterviewError::Auth("redirect rejected".to_string()))
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}
