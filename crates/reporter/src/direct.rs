//! Direct delivery - batched HTTPS POSTs to a Wavefront ingestion endpoint.
//!
//! # Design
//!
//! Construction validates the server URL and builds the HTTP client once;
//! an invalid URL means no usable sender ever exists. `send` splits the
//! line sequence into consecutive chunks of at most `batch_size`, preserving
//! order, and POSTs each chunk independently. A failing chunk is logged and
//! dropped while the remaining chunks are still attempted, so one bad batch
//! cannot lose the rest of the cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::header::CONTENT_TYPE;
use tracing::error;
use url::Url;

use crate::config::DirectConfig;
use crate::error::ReporterError;

/// Ingestion wire format requested via the `f` query parameter
const INGEST_FORMAT: &str = "graphite_v2";

/// Counters for direct delivery.
#[derive(Debug, Default)]
pub struct DirectMetrics {
    /// Chunks successfully POSTed
    pub posts_sent: AtomicU64,

    /// Chunks dropped on transport error or non-2xx status
    pub posts_failed: AtomicU64,

    /// Lines carried by successful chunks
    pub lines_sent: AtomicU64,
}

impl DirectMetrics {
    pub const fn new() -> Self {
        Self {
            posts_sent: AtomicU64::new(0),
            posts_failed: AtomicU64::new(0),
            lines_sent: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_sent(&self, lines: u64) {
        self.posts_sent.fetch_add(1, Ordering::Relaxed);
        self.lines_sent.fetch_add(lines, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failed(&self) {
        self.posts_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> DirectMetricsSnapshot {
        DirectMetricsSnapshot {
            posts_sent: self.posts_sent.load(Ordering::Relaxed),
            posts_failed: self.posts_failed.load(Ordering::Relaxed),
            lines_sent: self.lines_sent.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of direct delivery counters
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectMetricsSnapshot {
    pub posts_sent: u64,
    pub posts_failed: u64,
    pub lines_sent: u64,
}

/// Direct-ingestion delivery strategy.
pub struct DirectSender {
    config: DirectConfig,
    client: reqwest::Client,
    endpoint: String,
    metrics: Arc<DirectMetrics>,
}

impl DirectSender {
    /// Create a sender, validating the server URL.
    ///
    /// # Errors
    ///
    /// Returns `ReporterError::InvalidUrl` unless the server value parses as
    /// an absolute URL with a scheme and host. No network activity happens
    /// here.
    pub fn new(config: DirectConfig) -> Result<Self, ReporterError> {
        validate_server(&config.server)?;
        let endpoint = format!("{}/report", config.server.trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ReporterError::Request(e.to_string()))?;

        Ok(Self {
            config,
            client,
            endpoint,
            metrics: Arc::new(DirectMetrics::new()),
        })
    }

    /// Get reference to delivery counters
    pub fn metrics(&self) -> &DirectMetrics {
        &self.metrics
    }

    /// Deliver lines as one POST per chunk of at most `batch_size`.
    ///
    /// Chunks are isolated: a failure is logged, that chunk is dropped, and
    /// every remaining chunk is still attempted.
    pub async fn send(&self, lines: &[String]) {
        for chunk in lines.chunks(self.config.batch_size) {
            match self.post_chunk(chunk).await {
                Ok(()) => self.metrics.record_sent(chunk.len() as u64),
                Err(e) => {
                    self.metrics.record_failed();
                    error!(
                        endpoint = %self.endpoint,
                        lines = chunk.len(),
                        error = %e,
                        "error reporting to wavefront, chunk dropped"
                    );
                }
            }
        }
    }

    async fn post_chunk(&self, chunk: &[String]) -> Result<(), ReporterError> {
        let body = chunk.join("\n");
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("f", INGEST_FORMAT)])
            .header(CONTENT_TYPE, "text/plain")
            .bearer_auth(&self.config.token)
            .body(body)
            .send()
            .await
            .map_err(|e| ReporterError::Request(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ReporterError::Server(response.status().as_u16()))
        }
    }
}

fn validate_server(server: &str) -> Result<(), ReporterError> {
    let url =
        Url::parse(server).map_err(|e| ReporterError::InvalidUrl(format!("{server}: {e}")))?;
    if !url.has_host() {
        return Err(ReporterError::InvalidUrl(format!("{server}: missing host")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "direct_test.rs"]
mod direct_test;
