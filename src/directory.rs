//! Directory lookup seam.
//!
//! Role resolution for non-privileged principals needs one question
//! answered: who reports to this display name? The production
//! implementation asks the relay; tests substitute in-memory fakes.

use crate::error::{MeterviewError, Result};
use crate::relay::{Relay, RelayTarget};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// One directory record; only the display name is consumed here.
#[derive(Clone, Debug, Deserialize)]
pub struct DirectoryUser {
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// Seam for the external directory collaborator.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// All individuals who report to `manager`.
    ///
    /// An empty list is a valid answer (the principal manages no one).
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup cannot be completed; callers treat
    /// that as "no role assigned", not as an empty result.
    async fn reports_for(&self, manager: &str) -> Result<Vec<DirectoryUser>>;
}

/// Directory lookup that goes through the HTTP relay.
#[derive(Clone)]
pub struct RelayDirectory {
    relay: Arc<dyn Relay>,
}

impl RelayDirectory {
    #[must_use]
    pub fn new(relay: Arc<dyn Relay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl DirectoryLookup for RelayDirectory {
    async fn reports_for(&self, manager: &str) -> Result<Vec<DirectoryUser>> {
        let response = self
            .relay
            .invoke(
                RelayTarget::DirectReports {
                    manager: manager.to_string(),
                },
                None,
            )
            .await?;
        serde_json::from_value(response.body)
            .map_err(|e| MeterviewError::Directory(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_records_decode_from_wire_shape() {
        let users: Vec<DirectoryUser> = serde_json::from_str(
            r#"[{"displayName": "Bob", "mail": "bob@example.com"}, {"displayName": "Sue"}]"#,
        )
        .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].display_name, "Bob");
    }
}
