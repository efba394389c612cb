//! Sign-in orchestration.
//!
//! The identity provider's redirect/token protocol is a collaborator, not
//! something designed here: implement [`IdentityProvider`] over whatever
//! SDK owns the interactive flow. [`SignInFlow`] sequences the rest of a
//! sign-in: stamp the last login, persist the bearer token, resolve the
//! role, and fire the backend warm-up call.

use crate::error::Result;
use crate::relay::{Relay, RelayTarget};
use crate::resolver::{Resolution, RoleResolver};
use crate::session::{login_stamp, LocalStore, Principal, BEARER_TOKEN_KEY, LAST_LOGIN_KEY};
use async_trait::async_trait;
use std::sync::Arc;

/// Seam for the interactive identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive sign-in and return the authenticated principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect or token acquisition is rejected;
    /// the caller stays signed out.
    async fn sign_in(&self) -> Result<Principal>;

    /// Run the interactive sign-out.
    async fn sign_out(&self) -> Result<()>;
}

/// An authenticated dashboard session.
#[derive(Clone, Debug)]
pub struct Session {
    pub principal: Principal,
    /// `None` when role resolution failed: the user is signed in but the
    /// session cannot fetch consumption data.
    pub resolution: Option<Resolution>,
    /// The stamp written to the local store for this sign-in.
    pub last_login: String,
}

/// Orchestrates one sign-in from redirect to resolved session.
pub struct SignInFlow {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn LocalStore>,
    resolver: RoleResolver,
    relay: Arc<dyn Relay>,
}

impl SignInFlow {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn LocalStore>,
        resolver: RoleResolver,
        relay: Arc<dyn Relay>,
    ) -> Self {
        Self {
            identity,
            store,
            resolver,
            relay,
        }
    }

    /// Run the full sign-in sequence.
    ///
    /// Role-resolution failure is not fatal: the session comes back with
    /// `resolution: None` and the failure is logged. The warm-up call's
    /// response is discarded and its failure only logged.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication itself fails or the local store
    /// cannot be written.
    pub async fn sign_in(&self) -> Result<Session> {
        let principal = self.identity.sign_in().await.inspect_err(|error| {
            tracing::error!(target: "auth.sign_in", %error, "authentication failed");
        })?;
        tracing::info!(target: "auth.sign_in", name = %principal.display_name, "signed in");

        let last_login = login_stamp(&chrono::Local::now());
        self.store.set(LAST_LOGIN_KEY, &last_login).await?;
        self.store
            .set(BEARER_TOKEN_KEY, &principal.access_token)
            .await?;

        let resolution = match self.resolver.resolve(&principal.display_name).await {
            Ok(resolution) => Some(resolution),
            Err(error) => {
                tracing::error!(
                    target: "auth.sign_in",
                    name = %principal.display_name,
                    %error,
                    "role resolution failed; session cannot fetch data"
                );
                None
            }
        };

        // Side channel: warm the backend. No response is consumed.
        if let Err(error) = self.relay.invoke(RelayTarget::Initialise, None).await {
            tracing::warn!(target: "auth.sign_in", %error, "backend warm-up failed");
        }

        Ok(Session {
            principal,
            resolution,
            last_login,
        })
    }

    /// Run the interactive sign-out and drop the principal.
    ///
    /// The two local-store keys are deliberately left behind; the next
    /// mount still shows the last login time.
    pub async fn sign_out(&self) -> Result<()> {
        self.identity.sign_out().await.inspect_err(|error| {
            tracing::error!(target: "auth.sign_out", %error, "sign-out failed");
        })
    }

    /// The last-login stamp left by a previous session, if any.
    pub async fn stored_last_login(&self) -> Result<Option<String>> {
        self.store.get(LAST_LOGIN_KEY).await
    }
}
