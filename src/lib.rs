//! Meterview - client toolkit for a consumption-analytics dashboard
//!
//! Meterview owns the non-rendering half of a cloud-billing dashboard:
//! sign-in orchestration, role resolution against configurable
//! allowlists and a reporting directory, role-scoped fetching of the two
//! consumption streams through an HTTP relay, spreadsheet upload
//! validation and submission, and the aggregations the charts and tables
//! are built from.
//!
//! # Features
//!
//! - **Roles**: allowlist-first resolution with a single directory lookup
//!   for the manager/individual split
//! - **Fetching**: role-parameterized dispatch, both streams concurrent,
//!   stale results dropped by a generation guard
//! - **Uploads**: dual-grid ingestion (submit what was parsed, render the
//!   blank-filled copy), declarative per-column validation
//! - **Analytics**: top consumers, quarterly regional totals, consolidated
//!   filtering/sorting/pagination, en-IN formatting
//! - **Testing**: in-memory fakes for every external seam
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use meterview::ConfigBuilder;
//!
//! fn main() {
//!     // Initialize logging
//!     meterview::init_tracing();
//!
//!     let config = ConfigBuilder::new()
//!         .with_relay_url("https://relay.example.com/invoke")
//!         .from_env()
//!         .build();
//!
//!     let policy = config.load_policy().unwrap();
//!     let _ = policy;
//! }
//! ```

pub mod alert;
pub mod analytics;
pub mod auth;
mod config;
pub mod consumption;
pub mod directory;
mod error;
pub mod grid;
pub mod relay;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod testing;

// Re-exports for public API
pub use alert::{AlertSink, TracingAlerts};
pub use auth::{IdentityProvider, Session, SignInFlow};
pub use config::{Config, ConfigBuilder, LoggingConfig, RelayConfig, ResolverConfig};
pub use consumption::{ConsumptionFetcher, ConsumptionRecord, ConsumptionState, Stream};
pub use directory::{DirectoryLookup, DirectoryUser, RelayDirectory};
pub use error::{MeterviewError, Result};
pub use grid::{UploadGrid, ValidationReport};
pub use relay::{HttpRelay, Relay, RelayResponse, RelayTarget};
pub use resolver::{Resolution, RoleResolver};
pub use roles::{ManagedNameSet, Role, RolePolicy};
pub use session::{LocalStore, MemoryStore, Principal};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, before building any
/// flows.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "meterview=debug")
/// - `METERVIEW_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("METERVIEW_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
