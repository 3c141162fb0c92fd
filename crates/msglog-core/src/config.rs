//! Client configuration.

use std::time::Duration;

/// Local development deployment.
pub const DEFAULT_DEPLOYMENT_URL: &str = "http://127.0.0.1:3210";

/// Identity used for system-issued messages such as deletion requests.
pub const DEFAULT_SYSTEM_AUTHOR: &str = "Python pinger";

/// Default window for recent-message listings.
pub const DEFAULT_LIST_LIMIT: usize = 5;

/// Backend function paths for each remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionPaths {
    pub send: String,
    pub list_recent: String,
    pub list_all: String,
    pub clear_table: String,
    pub scan_incompletes: String,
    pub context_messages: String,
}

impl Default for FunctionPaths {
    fn default() -> Self {
        Self {
            send: "messages:send".to_string(),
            list_recent: "messages:listN".to_string(),
            list_all: "messages:list".to_string(),
            clear_table: "messages:clearTable".to_string(),
            scan_incompletes: "messages:scanIncompletes".to_string(),
            context_messages: "messages:getContextMessages".to_string(),
        }
    }
}

/// Connection settings for a remote deployment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the deployment.
    pub deployment_url: String,
    /// Opaque credential passed through to the backend.
    pub admin_key: Option<String>,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout: Duration,
    pub functions: FunctionPaths,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            deployment_url: DEFAULT_DEPLOYMENT_URL.to_string(),
            admin_key: None,
            request_timeout: Duration::from_secs(30),
            functions: FunctionPaths::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a config for a deployment URL with defaults elsewhere.
    #[must_use]
    pub fn new(deployment_url: impl Into<String>) -> Self {
        Self {
            deployment_url: deployment_url.into(),
            ..Self::default()
        }
    }

    /// Set the admin key.
    #[must_use]
    pub fn with_admin_key(mut self, admin_key: impl Into<String>) -> Self {
        self.admin_key = Some(admin_key.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Gateway behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Author of deletion requests and other system messages.
    pub system_author: String,
    /// Limit used when the caller does not pick one.
    pub default_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            system_author: DEFAULT_SYSTEM_AUTHOR.to_string(),
            default_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// How long to wait for scheduled deletions to land before re-reading.
///
/// The backend gives no completion signal, so verification polls: up to
/// `max_attempts` reads, each preceded by `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_attempts: 10,
        }
    }
}

impl SettlePolicy {
    #[must_use]
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on time spent waiting.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts.max(1))
    }
}
