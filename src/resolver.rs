//! Role resolution.
//!
//! Privileged roles are settled synchronously against the allowlists; the
//! long tail of managers and individual contributors takes one directory
//! lookup, and the only signal used to tell those two apart is whether the
//! lookup returned any subordinates.

use crate::alert::AlertSink;
use crate::directory::DirectoryLookup;
use crate::error::Result;
use crate::roles::{ManagedNameSet, Role, RolePolicy};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a successful resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub role: Role,
    /// Names this session may query. Empty for privileged roles, whose
    /// queries are scoped server-side.
    pub managed: ManagedNameSet,
}

/// Resolves a principal's display name to a role once per session.
pub struct RoleResolver {
    policy: RolePolicy,
    directory: Arc<dyn DirectoryLookup>,
    alerts: Arc<dyn AlertSink>,
    watchdog: Duration,
}

impl RoleResolver {
    #[must_use]
    pub fn new(
        policy: RolePolicy,
        directory: Arc<dyn DirectoryLookup>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            policy,
            directory,
            alerts,
            watchdog: Duration::from_secs(15),
        }
    }

    /// Set the watchdog bound for the directory lookup.
    #[must_use]
    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Resolve a display name, first match wins:
    /// global allowlist, east allowlist, west allowlist, directory lookup.
    ///
    /// The directory lookup result always gains the principal's own name;
    /// a singleton set means the principal manages no one.
    ///
    /// If the lookup outlasts the watchdog bound the user is warned once
    /// that the backend looks unresponsive; the lookup itself keeps
    /// running and its eventual result is still honored.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory lookup fails; no role is assigned
    /// and nothing is retried.
    pub async fn resolve(&self, display_name: &str) -> Result<Resolution> {
        if let Some(role) = self.policy.privileged_role(display_name) {
            tracing::info!(target: "roles.resolver", name = display_name, %role, "allowlist match");
            return Ok(Resolution {
                role,
                managed: ManagedNameSet::new(),
            });
        }

        let lookup = self.directory.reports_for(display_name);
        tokio::pin!(lookup);

        let outcome = tokio::select! {
            outcome = &mut lookup => outcome,
            () = tokio::time::sleep(self.watchdog) => {
                tracing::warn!(
                    target: "roles.resolver",
                    name = display_name,
                    watchdog_secs = self.watchdog.as_secs(),
                    "directory lookup still pending past watchdog"
                );
                self.alerts
                    .alert("The reporting backend is not responding. Data access may be unavailable.");
                // Watchdog, not cancellation: keep waiting for the lookup.
                lookup.await
            }
        };

        let reports = outcome.inspect_err(|error| {
            tracing::error!(
                target: "roles.resolver",
                name = display_name,
                %error,
                "directory lookup failed; session left without a role"
            );
        })?;

        let mut managed: ManagedNameSet =
            reports.into_iter().map(|user| user.display_name).collect();
        managed.insert(display_name);

        let role = if managed.len() == 1 {
            Role::IndividualContributor
        } else {
            Role::Manager
        };
        tracing::info!(
            target: "roles.resolver",
            name = display_name,
            %role,
            managed = managed.len(),
            "resolved from directory"
        );
        Ok(Resolution { role, managed })
    }
}
