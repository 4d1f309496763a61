//! Metric collection - registry snapshot to line-protocol lines.

use crate::config::ReporterConfig;
use crate::delta;
use crate::line::format_line;
use crate::registry::MetricsRegistry;

/// Walks a registry snapshot and renders every reading into a line.
///
/// Holds the immutable per-reporter formatting state. The tag string is
/// rendered once here and reused verbatim for every observation in every
/// cycle.
#[derive(Debug, Clone)]
pub struct LineCollector {
    prefix: String,
    source: String,
    tag_str: String,
}

impl LineCollector {
    pub fn new(config: &ReporterConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            source: config.source.clone(),
            tag_str: config.tag_str(),
        }
    }

    /// Collect one cycle's worth of lines from `registry`.
    ///
    /// Keys and value-suffixes are visited in the registry's own iteration
    /// order. Delta classification happens once per key, and delta counters
    /// are decremented by the exact snapshot value being reported. An empty
    /// result means nothing to report and is a valid no-op.
    pub fn collect(&self, registry: &dyn MetricsRegistry, timestamp: Option<u64>) -> Vec<String> {
        let mut lines = Vec::new();
        for family in registry.dump() {
            let is_delta = delta::is_delta_counter(&family.key, registry);
            for (suffix, value) in &family.values {
                if is_delta {
                    registry.dec_counter(&family.key, *value);
                }
                let name = if is_delta {
                    delta::delta_name(&self.prefix, &family.key, suffix)
                } else {
                    format!("{}{}.{}", self.prefix, family.key, suffix)
                };
                lines.push(format_line(&name, *value, timestamp, &self.source, &self.tag_str));
            }
        }
        lines
    }
}
