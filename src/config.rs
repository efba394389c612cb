use crate::error::Result;
use crate::roles::RolePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for a Meterview session.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the HTTP relay the dashboard talks through.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// The single fixed relay URL every request is POSTed to.
    #[serde(default = "default_relay_url")]
    pub url: String,
    /// Base URL of the backend the relay forwards to; embedded verbatim in
    /// each request's `GetURL`.
    #[serde(default = "default_backend_base")]
    pub backend_base: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Settings for role resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// How long role resolution may stay pending before the user is warned
    /// that the backend looks unresponsive. The lookup itself is never
    /// cancelled.
    #[serde(default = "default_watchdog_secs")]
    pub watchdog_secs: u64,
    /// Optional path to a JSON allowlist file; absent means empty
    /// allowlists (every principal goes through the directory lookup).
    #[serde(default)]
    pub policy_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: default_relay_url(),
            backend_base: default_backend_base(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            watchdog_secs: default_watchdog_secs(),
            policy_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_relay_url() -> String {
    "http://localhost:3000/relay".to_string()
}

fn default_backend_base() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_watchdog_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

impl RelayConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.watchdog_secs)
    }
}

impl Config {
    /// Load the role allowlists named by this configuration.
    ///
    /// With no `policy_file` configured the policy is empty, which sends
    /// every principal through the directory lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy file cannot be read or parsed.
    pub fn load_policy(&self) -> Result<RolePolicy> {
        match &self.resolver.policy_file {
            Some(path) => RolePolicy::from_file(path),
            None => Ok(RolePolicy::default()),
        }
    }
}

/// Builder for Config with environment variable support
///
/// # Example
///
/// ```rust
/// use meterview::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .with_relay_url("https://relay.example.com/invoke")
///     .with_watchdog_secs(15)
///     .from_env()
///     .build();
/// assert_eq!(config.resolver.watchdog_secs, 15);
/// ```
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.config.relay.url = url.into();
        self
    }

    pub fn with_backend_base(mut self, base: impl Into<String>) -> Self {
        self.config.relay.backend_base = base.into();
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.relay.request_timeout_secs = secs;
        self
    }

    pub fn with_watchdog_secs(mut self, secs: u64) -> Self {
        self.config.resolver.watchdog_secs = secs;
        self
    }

    pub fn with_policy_file(mut self, path: impl Into<String>) -> Self {
        self.config.resolver.policy_file = Some(path.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    /// Override settings from `METERVIEW_*` environment variables.
    ///
    /// Recognized: `METERVIEW_RELAY_URL`, `METERVIEW_BACKEND_BASE`,
    /// `METERVIEW_REQUEST_TIMEOUT_SECS`, `METERVIEW_WATCHDOG_SECS`,
    /// `METERVIEW_POLICY_FILE`, `METERVIEW_LOG_LEVEL`, `METERVIEW_LOG_JSON`.
    pub fn from_env(mut self) -> Self {
        if let Ok(url) = std::env::var("METERVIEW_RELAY_URL") {
            self.config.relay.url = url;
        }
        if let Ok(base) = std::env::var("METERVIEW_BACKEND_BASE") {
            self.config.relay.backend_base = base;
        }
        if let Ok(secs) = std::env::var("METERVIEW_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.config.relay.request_timeout_secs = secs;
            }
        }
        if let Ok(secs) = std::env::var("METERVIEW_WATCHDOG_SECS") {
            if let Ok(secs) = secs.parse() {
                self.config.resolver.watchdog_secs = secs;
            }
        }
        if let Ok(path) = std::env::var("METERVIEW_POLICY_FILE") {
            self.config.resolver.policy_file = Some(path);
        }
        if let Ok(level) = std::env::var("METERVIEW_LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Ok(json) = std::env::var("METERVIEW_LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.resolver.watchdog_secs, 15);
        assert_eq!(config.relay.request_timeout_secs, 30);
        assert!(config.resolver.policy_file.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ConfigBuilder::new()
            .with_relay_url("https://relay.example.com/invoke")
            .with_backend_base("http://10.0.0.5:3000")
            .with_watchdog_secs(5)
            .with_policy_file("/etc/meterview/policy.json")
            .build();

        assert_eq!(config.relay.url, "https://relay.example.com/invoke");
        assert_eq!(config.relay.backend_base, "http://10.0.0.5:3000");
        assert_eq!(config.resolver.watchdog(), Duration::from_secs(5));
        assert_eq!(
            config.resolver.policy_file.as_deref(),
            Some("/etc/meterview/policy.json")
        );
    }

    #[test]
    fn builder_sets_the_logging_section() {
        let config = ConfigBuilder::new()
            .with_log_level("meterview=debug")
            .with_json_logging(true)
            .build();
        assert_eq!(config.logging.level, "meterview=debug");
        assert!(config.logging.json);
    }

    #[test]
    fn empty_policy_when_no_file_configured() {
        let config = Config::default();
        let policy = config.load_policy().unwrap();
        assert_eq!(policy.privileged_role("anyone"), None);
    }

    #[test]
    fn config_deserializes_with_partial_sections() {
        let config: Config =
            serde_json::from_str(r#"{"relay": {"url": "http://r"}, "resolver": {}, "logging": {}}"#)
                .unwrap();
        assert_eq!(config.relay.url, "http://r");
        assert_eq!(config.relay.request_timeout_secs, 30);
        assert_eq!(config.resolver.watchdog_secs, 15);
    }
}
