//! HTTP relay client.
//!
//! Every backend interaction goes through a single fixed relay URL. The
//! relay accepts `POST { "GetURL": <backend url>, "data"?: <payload> }`,
//! forwards to the named backend path, and passes the response back
//! verbatim as JSON. [`RelayTarget`] enumerates the backend paths this
//! crate is allowed to name.

use crate::config::RelayConfig;
use crate::consumption::Stream;
use crate::error::{MeterviewError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Regional query scope for the two regional-admin roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionScope {
    East,
    West,
}

impl RegionScope {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::East => "east",
            Self::West => "west",
        }
    }
}

/// A backend operation reachable through the relay.
#[derive(Clone, Debug, PartialEq)]
pub enum RelayTarget {
    /// Warm-up call issued once per sign-in; response is discarded.
    Initialise,
    /// All records for one stream, unfiltered.
    FetchAll(Stream),
    /// Records owned by a manager's name set (names travel in `data`).
    ByManager(Stream),
    /// Records owned by a single account manager.
    ByIndividual { stream: Stream, name: String },
    /// Records for one regional-admin scope.
    Regional { stream: Stream, scope: RegionScope },
    /// Directory lookup: everyone reporting to the named manager.
    DirectReports { manager: String },
    /// Bulk upload of a validated spreadsheet grid.
    BulkIngest(Stream),
}

impl RelayTarget {
    /// Backend path this target maps to, relative to the backend base URL.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Initialise => "/".to_string(),
            Self::FetchAll(stream) => format!("/get-all-{stream}"),
            Self::ByManager(stream) => format!("/get-{stream}-by-manager"),
            Self::ByIndividual { stream, name } => {
                format!("/get-{stream}-by-account-manager/{name}")
            }
            Self::Regional { stream, scope } => {
                format!("/get-{stream}-{}-region", scope.as_str())
            }
            Self::DirectReports { manager } => format!("/get-users-by-manager/{manager}/"),
            Self::BulkIngest(stream) => format!("/ingest-{stream}"),
        }
    }
}

/// A relay response: the upstream status plus the passed-through body.
#[derive(Clone, Debug)]
pub struct RelayResponse {
    pub status: u16,
    pub body: Value,
}

/// Seam for issuing relay calls.
///
/// The production implementation is [`HttpRelay`]; tests substitute
/// scripted fakes.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Invoke a backend target through the relay.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures and non-success statuses;
    /// there is no retry at this layer.
    async fn invoke(&self, target: RelayTarget, data: Option<Value>) -> Result<RelayResponse>;
}

/// Relay client backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpRelay {
    relay_url: String,
    backend_base: String,
    client: reqwest::Client,
}

impl HttpRelay {
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            relay_url: config.url.clone(),
            backend_base: config.backend_base.clone(),
            client: Self::build_client(config.request_timeout()),
        }
    }

    /// Build HTTP client with given timeout.
    fn build_client(timeout: Duration) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("meterview")
            .build()
            .unwrap_or_default()
    }

    fn envelope(&self, target: &RelayTarget, data: Option<Value>) -> Value {
        let mut body = json!({ "GetURL": format!("{}{}", self.backend_base, target.path()) });
        if let Some(data) = data {
            body["data"] = data;
        }
        body
    }
}

#[async_trait]
impl Relay for HttpRelay {
    async fn invoke(&self, target: RelayTarget, data: Option<Value>) -> Result<RelayResponse> {
        let body = self.envelope(&target, data);
        tracing::debug!(target: "relay.client", path = %target.path(), "invoking relay");

        let response = self.client.post(&self.relay_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MeterviewError::Relay {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }

        // Some backend paths (the warm-up in particular) answer with an
        // empty or non-JSON body; pass those through as null.
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(RelayResponse {
            status: status.as_u16(),
            body,
        })
    }
}
