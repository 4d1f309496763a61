//! Metrics registry collaborator interface.
//!
//! The reporter never stores or aggregates metric values itself; it reads a
//! snapshot from a registry each cycle and, for delta counters, writes back a
//! decrement. `MetricsRegistry` is the seam: concrete registries implement it
//! so the collector can walk them without knowing their types.
//!
//! `SimpleRegistry` is a minimal insertion-ordered implementation so the
//! crate is usable and testable standalone. Aggregating metric kinds
//! (histograms, meters, timers) belong to a real registry.

use parking_lot::Mutex;

use crate::delta::{DELTA_PREFIX, has_delta_prefix};

/// Kind of a registered counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// Reported as an absolute running total
    Cumulative,
    /// Reported as the increment since the previous read, then reset
    Delta,
}

/// One metric key and its value group from a registry snapshot.
///
/// `values` maps value-suffixes ("count", "mean", "p99", ...) to readings,
/// in the registry's own iteration order.
#[derive(Debug, Clone)]
pub struct MetricFamily {
    pub key: String,
    pub values: Vec<(String, f64)>,
}

/// Interface the reporter consumes from a metrics registry.
pub trait MetricsRegistry: Send + Sync {
    /// Snapshot every registered metric, in the registry's own order.
    fn dump(&self) -> Vec<MetricFamily>;

    /// Metadata lookup for the counter registered under `key`, if any.
    fn counter_kind(&self, key: &str) -> Option<CounterKind>;

    /// Decrement the counter under `key` by `amount`.
    ///
    /// The collector passes the exact value captured in the snapshot it is
    /// reporting, never a re-read one. Atomicity of the read-decrement pair
    /// under concurrent mutation is this registry's contract, not the
    /// collector's.
    fn dec_counter(&self, key: &str, amount: f64);
}

enum Slot {
    Counter { kind: CounterKind, value: f64 },
    Gauge(f64),
}

/// Minimal thread-safe registry preserving registration order.
#[derive(Default)]
pub struct SimpleRegistry {
    entries: Mutex<Vec<(String, Slot)>>,
}

impl SimpleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the cumulative counter under `key`, registering it on first use.
    pub fn inc_counter(&self, key: &str, amount: f64) {
        self.inc(key, CounterKind::Cumulative, amount);
    }

    /// Increment a delta counter, registering it on first use.
    ///
    /// The key is normalized to carry the canonical delta marker; the
    /// registered key is returned.
    pub fn inc_delta(&self, key: &str, amount: f64) -> String {
        let key = if has_delta_prefix(key) {
            key.to_string()
        } else {
            format!("{DELTA_PREFIX}{key}")
        };
        self.inc(&key, CounterKind::Delta, amount);
        key
    }

    /// Set the gauge under `key`, registering it on first use.
    pub fn set_gauge(&self, key: &str, value: f64) {
        let mut entries = self.entries.lock();
        for (k, slot) in entries.iter_mut() {
            if k.as_str() == key {
                *slot = Slot::Gauge(value);
                return;
            }
        }
        entries.push((key.to_string(), Slot::Gauge(value)));
    }

    fn inc(&self, key: &str, kind: CounterKind, amount: f64) {
        let mut entries = self.entries.lock();
        for (k, slot) in entries.iter_mut() {
            if k.as_str() == key {
                if let Slot::Counter { value, .. } = slot {
                    *value += amount;
                }
                return;
            }
        }
        entries.push((key.to_string(), Slot::Counter { kind, value: amount }));
    }
}

impl MetricsRegistry for SimpleRegistry {
    fn dump(&self) -> Vec<MetricFamily> {
        let entries = self.entries.lock();
        entries
            .iter()
            .map(|(key, slot)| MetricFamily {
                key: key.clone(),
                values: match slot {
                    Slot::Counter { value, .. } => vec![("count".to_string(), *value)],
                    Slot::Gauge(value) => vec![("value".to_string(), *value)],
                },
            })
            .collect()
    }

    fn counter_kind(&self, key: &str) -> Option<CounterKind> {
        let entries = self.entries.lock();
        entries.iter().find_map(|(k, slot)| match slot {
            Slot::Counter { kind, .. } if k.as_str() == key => Some(*kind),
            _ => None,
        })
    }

    fn dec_counter(&self, key: &str, amount: f64) {
        let mut entries = self.entries.lock();
        for (k, slot) in entries.iter_mut() {
            if k.as_str() == key {
                if let Slot::Counter { value, .. } = slot {
                    *value -= amount;
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_preserves_registration_order() {
        let registry = SimpleRegistry::new();
        registry.inc_counter("b", 1.0);
        registry.set_gauge("a", 2.0);
        registry.inc_counter("c", 3.0);

        let keys: Vec<_> = registry.dump().into_iter().map(|f| f.key).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_counter_accumulates() {
        let registry = SimpleRegistry::new();
        registry.inc_counter("requests", 40.0);
        registry.inc_counter("requests", 2.0);

        let dump = registry.dump();
        assert_eq!(dump.len(), 1);
        assert_eq!(dump[0].values, vec![("count".to_string(), 42.0)]);
    }

    #[test]
    fn test_gauge_overwrites() {
        let registry = SimpleRegistry::new();
        registry.set_gauge("queue_depth", 5.0);
        registry.set_gauge("queue_depth", 7.0);

        let dump = registry.dump();
        assert_eq!(dump[0].values, vec![("value".to_string(), 7.0)]);
    }

    #[test]
    fn test_delta_key_normalized() {
        let registry = SimpleRegistry::new();
        let key = registry.inc_delta("requests", 1.0);
        assert_eq!(key, "\u{2206}requests");

        // Already-marked keys are kept as registered
        let alt = registry.inc_delta("\u{0394}errors", 1.0);
        assert_eq!(alt, "\u{0394}errors");

        assert_eq!(registry.counter_kind(&key), Some(CounterKind::Delta));
        assert_eq!(registry.counter_kind(&alt), Some(CounterKind::Delta));
    }

    #[test]
    fn test_counter_kind_lookup() {
        let registry = SimpleRegistry::new();
        registry.inc_counter("plain", 1.0);
        registry.set_gauge("g", 1.0);

        assert_eq!(registry.counter_kind("plain"), Some(CounterKind::Cumulative));
        assert_eq!(registry.counter_kind("g"), None);
        assert_eq!(registry.counter_kind("missing"), None);
    }

    #[test]
    fn test_dec_counter() {
        let registry = SimpleRegistry::new();
        let key = registry.inc_delta("requests", 42.0);
        registry.dec_counter(&key, 42.0);

        let dump = registry.dump();
        assert_eq!(dump[0].values, vec![("count".to_string(), 0.0)]);

        // Unknown keys are ignored
        registry.dec_counter("missing", 1.0);
    }
}
