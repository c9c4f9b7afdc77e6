use std::env;
use std::time::Duration;

use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
/// Largest response body the transport will buffer: 64 MiB.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Settings fixed when the gateway is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Sent as `content-type` on every request unless overridden per call.
    pub content_type: String,
    /// Keep and resend cookies the server sets (the refresh credential).
    pub with_credentials: bool,
    /// Abort calls that take longer than this. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Response bodies longer than this are dropped; the status is kept.
    pub max_body_bytes: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            with_credentials: true,
            timeout: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl GatewayConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_credentials(mut self, include: bool) -> Self {
        self.with_credentials = include;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Read `API_BASE_URL`, `API_TIMEOUT_MS`, `API_WITH_CREDENTIALS` and
    /// `API_MAX_BODY_BYTES` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or unparsable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_url = lookup("API_BASE_URL").unwrap_or_else(|| {
            info!("API_BASE_URL not set, using default: {}", defaults.base_url);
            defaults.base_url.clone()
        });

        let timeout = lookup("API_TIMEOUT_MS").and_then(|raw| match raw.parse::<u64>() {
            Ok(0) => None,
            Ok(ms) => Some(Duration::from_millis(ms)),
            Err(e) => {
                warn!("Invalid API_TIMEOUT_MS value {raw:?}: {e}");
                None
            }
        });

        let with_credentials = lookup("API_WITH_CREDENTIALS")
            .and_then(|raw| match raw.parse::<bool>() {
                Ok(flag) => Some(flag),
                Err(e) => {
                    warn!("Invalid API_WITH_CREDENTIALS value {raw:?}: {e}");
                    None
                }
            })
            .unwrap_or(defaults.with_credentials);

        let max_body_bytes = lookup("API_MAX_BODY_BYTES")
            .and_then(|raw| match raw.parse::<u64>() {
                Ok(0) => {
                    warn!("API_MAX_BODY_BYTES must be positive, using default");
                    None
                }
                Ok(limit) => Some(limit),
                Err(e) => {
                    warn!("Invalid API_MAX_BODY_BYTES value {raw:?}: {e}");
                    None
                }
            })
            .unwrap_or(defaults.max_body_bytes);

        Self {
            base_url,
            content_type: defaults.content_type,
            with_credentials,
            timeout,
            max_body_bytes,
        }
    }
}
