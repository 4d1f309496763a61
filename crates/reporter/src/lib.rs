//! Wavefront metrics reporter.
//!
//! Periodically drains an in-process metrics registry and ships the readings
//! to a Wavefront backend in plaintext line protocol, over one of two
//! transports chosen at construction time:
//!
//! - **Proxy**: a persistent TCP stream of newline-delimited lines to a
//!   local relay, reconnecting and retrying a failed batch exactly once.
//! - **Direct**: batched HTTPS POSTs to a direct ingestion endpoint, one
//!   bearer-authenticated request per chunk, failures isolated per chunk.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐     ┌───────────────┐     ┌────────────────────┐
//! │  Registry  │────▶│ LineCollector │────▶│      Delivery      │
//! │ (snapshot) │     │ (delta reset, │     │  Proxy  |  Direct  │
//! └────────────┘     │  formatting)  │     │  (TCP)  | (HTTPS)  │
//!       ▲            └───────────────┘     └────────────────────┘
//!       │ decrement delta counters                  │
//!       └──────── same cycle, same value            ▼ network
//! ```
//!
//! The external scheduler calls [`WavefrontReporter::report_now`] once per
//! interval; this crate performs no scheduling or task spawning itself.
//! Delivery is best-effort: transport failures are logged and the affected
//! batch is dropped, so a bad cycle never reaches the scheduler.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wavefront_reporter::{DirectConfig, ReporterConfig, SimpleRegistry, WavefrontReporter};
//!
//! let registry = Arc::new(SimpleRegistry::new());
//! registry.inc_counter("requests", 1.0);
//!
//! let reporter = WavefrontReporter::direct(
//!     ReporterConfig::default()
//!         .with_source("app-01")
//!         .with_prefix("direct.")
//!         .with_tag("env", "prod"),
//!     DirectConfig::new("https://example.wavefront.com", token),
//!     registry,
//! )?;
//!
//! // From the scheduling loop:
//! reporter.report_now(None).await;
//!
//! // On shutdown:
//! reporter.stop().await;
//! ```

pub mod collector;
pub mod config;
pub mod delta;
pub mod direct;
pub mod error;
pub mod line;
pub mod proxy;
pub mod registry;
pub mod reporter;

pub use collector::LineCollector;
pub use config::{DirectConfig, ProxyConfig, ReporterConfig};
pub use direct::{DirectMetrics, DirectMetricsSnapshot, DirectSender};
pub use error::ReporterError;
pub use line::format_line;
pub use proxy::{ProxyMetrics, ProxyMetricsSnapshot, ProxySender};
pub use registry::{CounterKind, MetricFamily, MetricsRegistry, SimpleRegistry};
pub use reporter::{Delivery, WavefrontReporter};
