//! Reporter configuration.
//!
//! Three immutable config structs, one per concern: `ReporterConfig` for the
//! formatting state shared by both transports, `ProxyConfig` for the TCP
//! relay transport, `DirectConfig` for direct HTTPS ingestion.
//!
//! # Example
//!
//! ```toml
//! [reporter]
//! source = "app-01"
//! prefix = "direct."
//! interval = "10s"
//!
//! [reporter.tags]
//! env = "prod"
//! region = "us-west-2"
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Default source tag attached to every observation
pub const DEFAULT_SOURCE: &str = "wavefront-reporter";

/// Default reporting interval (owned by the external scheduler)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Default Wavefront proxy port
pub const DEFAULT_PROXY_PORT: u16 = 2878;

/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default write timeout per batch
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default TCP keep-alive interval
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Default lines per direct-ingestion POST
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Default HTTP request timeout for direct ingestion
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Formatting state shared by both transports.
///
/// Immutable once the reporter is constructed; the point-tag set is rendered
/// to its wire form exactly once and reused verbatim every cycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Source identifier stamped on every line
    pub source: String,

    /// Metric name prefix (conventionally "proxy." or "direct.")
    pub prefix: String,

    /// Point tags attached to every observation
    pub tags: BTreeMap<String, String>,

    /// Reporting interval for the external scheduler
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            prefix: String::new(),
            tags: BTreeMap::new(),
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl ReporterConfig {
    /// Set the source identifier
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the metric name prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Add a point tag
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the reporting interval
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Render the point tags to their wire form: `"k"="v"` pairs joined by
    /// spaces, in map order. Called once at reporter construction.
    pub fn tag_str(&self) -> String {
        self.tags
            .iter()
            .map(|(k, v)| format!("\"{k}\"=\"{v}\""))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Configuration for the proxy (TCP relay) transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Relay host
    pub host: String,

    /// Relay line-protocol port
    pub port: u16,

    /// TCP connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Write timeout per batch
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// TCP keep-alive enabled
    pub tcp_keepalive: bool,

    /// TCP keep-alive interval (only used if tcp_keepalive is true)
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive_interval: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PROXY_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            tcp_keepalive: true,
            tcp_keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
        }
    }
}

impl ProxyConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Set the connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the write timeout
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Enable or disable TCP keep-alive
    #[must_use]
    pub fn with_tcp_keepalive(mut self, enabled: bool) -> Self {
        self.tcp_keepalive = enabled;
        self
    }

    /// Set the TCP keep-alive interval
    #[must_use]
    pub fn with_tcp_keepalive_interval(mut self, interval: Duration) -> Self {
        self.tcp_keepalive_interval = interval;
        self
    }

    /// Relay address as `host:port`
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the direct-ingestion (HTTPS) transport.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectConfig {
    /// Ingestion server URL, e.g. `https://example.wavefront.com`
    pub server: String,

    /// API token sent as a bearer authorization header
    pub token: String,

    /// Maximum lines per POST
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// HTTP request timeout
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl DirectConfig {
    pub fn new(server: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            token: token.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the maximum lines per POST
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the HTTP request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}
