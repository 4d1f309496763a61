//! Wavefront reporter - one registry, one delivery strategy.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::collector::LineCollector;
use crate::config::{DirectConfig, ProxyConfig, ReporterConfig};
use crate::direct::DirectSender;
use crate::error::ReporterError;
use crate::proxy::ProxySender;
use crate::registry::MetricsRegistry;

/// Delivery strategy chosen at construction time.
///
/// Exactly two transports exist; a new transport is a new variant here and
/// never a change to the collector.
pub enum Delivery {
    Proxy(ProxySender),
    Direct(DirectSender),
}

/// Periodic reporter draining a metrics registry to Wavefront.
///
/// Reporting is invoked by an external scheduler; this type does no
/// scheduling or task spawning of its own. Within one invocation,
/// collection (including delta-counter resets) completes before any
/// delivery I/O starts.
pub struct WavefrontReporter {
    registry: Arc<dyn MetricsRegistry>,
    collector: LineCollector,
    delivery: Delivery,
}

impl WavefrontReporter {
    /// Reporter delivering over a persistent TCP stream to a relay.
    pub fn proxy(
        config: ReporterConfig,
        proxy: ProxyConfig,
        registry: Arc<dyn MetricsRegistry>,
    ) -> Self {
        Self {
            collector: LineCollector::new(&config),
            registry,
            delivery: Delivery::Proxy(ProxySender::new(proxy)),
        }
    }

    /// Reporter delivering via batched POSTs to a direct ingestion endpoint.
    ///
    /// # Errors
    ///
    /// Fails with `ReporterError::InvalidUrl` when the configured server is
    /// not an absolute URL with a scheme and host; no partially usable
    /// reporter is returned.
    pub fn direct(
        config: ReporterConfig,
        direct: DirectConfig,
        registry: Arc<dyn MetricsRegistry>,
    ) -> Result<Self, ReporterError> {
        let sender = DirectSender::new(direct)?;
        Ok(Self {
            collector: LineCollector::new(&config),
            registry,
            delivery: Delivery::Direct(sender),
        })
    }

    /// The delivery strategy, mainly for metrics inspection.
    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Collect the registry's current readings and deliver them.
    ///
    /// The proxy path stamps lines with the current Unix time when no
    /// timestamp is given; the direct path forwards the caller's timestamp
    /// untouched and otherwise lets the backend assign arrival time. An
    /// empty collection is a no-op. Transport failures are logged inside
    /// the delivery strategy and never propagate here.
    pub async fn report_now(&self, timestamp: Option<u64>) {
        let timestamp = match &self.delivery {
            Delivery::Proxy(_) => timestamp.or_else(|| Some(unix_now())),
            Delivery::Direct(_) => timestamp,
        };
        let lines = self.collector.collect(self.registry.as_ref(), timestamp);
        if lines.is_empty() {
            return;
        }
        match &self.delivery {
            Delivery::Proxy(sender) => sender.send(&lines).await,
            Delivery::Direct(sender) => sender.send(&lines).await,
        }
    }

    /// Release held connections. Idempotent.
    pub async fn stop(&self) {
        if let Delivery::Proxy(sender) = &self.delivery {
            sender.stop().await;
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
