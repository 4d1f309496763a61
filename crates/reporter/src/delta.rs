//! Delta counter classification and naming.
//!
//! Delta counters carry reset-on-read semantics: each cycle reports only the
//! increment since the previous read. They are registered under a key with a
//! leading delta marker, and their wire name re-applies the canonical marker
//! in front of the fully prefixed name so the backend aggregates them as
//! increments rather than absolute values.

use crate::registry::{CounterKind, MetricsRegistry};

/// Canonical delta marker (U+2206, INCREMENT)
pub const DELTA_PREFIX: char = '\u{2206}';

/// Alternate delta marker accepted on registration (U+0394, GREEK CAPITAL DELTA)
pub const ALT_DELTA_PREFIX: char = '\u{0394}';

/// Whether `key` carries a delta marker.
#[inline]
pub fn has_delta_prefix(key: &str) -> bool {
    key.starts_with(DELTA_PREFIX) || key.starts_with(ALT_DELTA_PREFIX)
}

/// Whether the counter registered under `key` is a delta counter.
///
/// Pure predicate over the registry's counter metadata; never mutates.
pub fn is_delta_counter(key: &str, registry: &dyn MetricsRegistry) -> bool {
    matches!(registry.counter_kind(key), Some(CounterKind::Delta))
}

/// Wire name for a delta counter value.
///
/// Strips any delta marker from the registered key and re-applies the
/// canonical `∆` ahead of the whole prefixed name:
/// `∆{prefix}{key}.{suffix}`.
pub fn delta_name(prefix: &str, key: &str, suffix: &str) -> String {
    let stripped = key.trim_start_matches(&[DELTA_PREFIX, ALT_DELTA_PREFIX][..]);
    format!("{DELTA_PREFIX}{prefix}{stripped}.{suffix}")
}
