//! Proxy delivery - persistent TCP stream to a Wavefront relay.
//!
//! # Design
//!
//! The sender owns an exclusive connection slot. The connection is absent at
//! construction, established lazily on the first send, torn down on any
//! write failure, and closed by `stop()`.
//!
//! Failure policy per `send` call: the first connect/write error discards
//! the connection and the whole batch is retried once against a fresh
//! connection. A second error logs and drops the batch. No partial-success
//! accounting; a batch either all succeeds or counts as wholly failed.
//!
//! The slot sits behind a `tokio::sync::Mutex` so overlapping reporting
//! cycles from an external scheduler serialize instead of sharing the
//! stream.

use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use socket2::{SockRef, TcpKeepalive};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::config::ProxyConfig;
use crate::error::ReporterError;

/// Counters for proxy delivery.
#[derive(Debug, Default)]
pub struct ProxyMetrics {
    /// Batches fully written
    pub batches_sent: AtomicU64,

    /// Batches dropped after the retry also failed
    pub batches_dropped: AtomicU64,

    /// Lines written in successful batches
    pub lines_sent: AtomicU64,

    /// Connections established
    pub connects: AtomicU64,

    /// Whole-batch retries after a first failure
    pub retries: AtomicU64,
}

impl ProxyMetrics {
    pub const fn new() -> Self {
        Self {
            batches_sent: AtomicU64::new(0),
            batches_dropped: AtomicU64::new(0),
            lines_sent: AtomicU64::new(0),
            connects: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_sent(&self, lines: u64) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.lines_sent.fetch_add(lines, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_connect(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> ProxyMetricsSnapshot {
        ProxyMetricsSnapshot {
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            lines_sent: self.lines_sent.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of proxy delivery counters
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyMetricsSnapshot {
    pub batches_sent: u64,
    pub batches_dropped: u64,
    pub lines_sent: u64,
    pub connects: u64,
    pub retries: u64,
}

/// Connection slot state.
enum Connection {
    Disconnected,
    Connected(TcpStream),
}

impl Connection {
    /// Return the live stream, connecting first if the slot is empty.
    async fn ensure(
        &mut self,
        config: &ProxyConfig,
        metrics: &ProxyMetrics,
    ) -> Result<&mut TcpStream, ReporterError> {
        if matches!(self, Connection::Disconnected) {
            *self = Connection::Connected(connect(config, metrics).await?);
        }
        match self {
            Connection::Connected(stream) => Ok(stream),
            Connection::Disconnected => Err(ReporterError::NoConnection),
        }
    }
}

/// Second half of the retry-exactly-once guard: a `send` call walks this
/// sequence and never loops back.
#[derive(Clone, Copy)]
enum Attempt {
    Initial,
    Retry,
}

/// Proxy delivery strategy.
pub struct ProxySender {
    config: ProxyConfig,
    connection: Mutex<Connection>,
    metrics: Arc<ProxyMetrics>,
}

impl ProxySender {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(Connection::Disconnected),
            metrics: Arc::new(ProxyMetrics::new()),
        }
    }

    /// Get reference to delivery counters
    pub fn metrics(&self) -> &ProxyMetrics {
        &self.metrics
    }

    /// Deliver a batch of lines, newline-terminated, over one connection.
    ///
    /// Transport errors never propagate: after the single reconnect-and-
    /// retry, a still-failing batch is logged and dropped, and the next
    /// cycle starts clean.
    pub async fn send(&self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        let mut conn = self.connection.lock().await;
        for attempt in [Attempt::Initial, Attempt::Retry] {
            match self.write_batch(&mut conn, lines).await {
                Ok(()) => {
                    self.metrics.record_sent(lines.len() as u64);
                    return;
                }
                Err(e) => {
                    *conn = Connection::Disconnected;
                    match attempt {
                        Attempt::Initial => {
                            self.metrics.record_retry();
                            debug!(
                                addr = %self.config.target(),
                                error = %e,
                                "proxy write failed, retrying batch on a fresh connection"
                            );
                        }
                        Attempt::Retry => {
                            self.metrics.record_dropped();
                            error!(
                                addr = %self.config.target(),
                                lines = lines.len(),
                                error = %e,
                                "error reporting to wavefront proxy, batch dropped"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Close any live connection. Idempotent.
    pub async fn stop(&self) {
        let mut conn = self.connection.lock().await;
        if let Connection::Connected(mut stream) =
            std::mem::replace(&mut *conn, Connection::Disconnected)
        {
            let _ = stream.shutdown().await;
        }
    }

    async fn write_batch(
        &self,
        conn: &mut Connection,
        lines: &[String],
    ) -> Result<(), ReporterError> {
        let stream = conn.ensure(&self.config, &self.metrics).await?;
        let write = async {
            for line in lines {
                stream.write_all(line.as_bytes()).await?;
                stream.write_all(b"\n").await?;
            }
            stream.flush().await?;
            Ok::<_, std::io::Error>(())
        };
        match timeout(self.config.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ReporterError::WriteFailed(e)),
            Err(_) => Err(ReporterError::Timeout),
        }
    }
}

async fn connect(
    config: &ProxyConfig,
    metrics: &ProxyMetrics,
) -> Result<TcpStream, ReporterError> {
    let target = config.target();
    let stream = match timeout(config.connect_timeout, TcpStream::connect(&target)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return Err(ReporterError::ConnectionFailed { target, source: e });
        }
        Err(_) => {
            return Err(ReporterError::ConnectionFailed {
                target,
                source: std::io::Error::new(ErrorKind::TimedOut, "connection timed out"),
            });
        }
    };

    // Non-fatal socket options
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "failed to set TCP_NODELAY, continuing with default buffering");
    }
    if config.tcp_keepalive {
        let sock_ref = SockRef::from(&stream);
        let keepalive = TcpKeepalive::new().with_time(config.tcp_keepalive_interval);

        #[cfg(target_os = "linux")]
        let keepalive = keepalive.with_interval(config.tcp_keepalive_interval);

        if let Err(e) = sock_ref.set_tcp_keepalive(&keepalive) {
            debug!(error = %e, "failed to set TCP keep-alive, continuing without keep-alive");
        }
    }

    metrics.record_connect();
    debug!(addr = %target, "connected to wavefront proxy");
    Ok(stream)
}

#[cfg(test)]
#[path = "proxy_test.rs"]
mod proxy_test;
