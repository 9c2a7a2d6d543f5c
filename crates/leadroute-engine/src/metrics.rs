//! Metrics collection for routing degradation paths
//!
//! Silent fallbacks (unknown operators, bad regexes, lost balancer races)
//! are load-bearing behavior, so they are counted here in addition to the
//! `tracing` output, giving operators something to alert on.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Counter metric
#[derive(Debug, Clone)]
pub struct Counter {
    name: &'static str,
    value: Arc<RwLock<u64>>,
}

impl Counter {
    /// Create a new counter
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: Arc::new(RwLock::new(0)),
        }
    }

    /// Counter name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Increment the counter
    pub fn inc(&self) {
        *self.value.write().unwrap() += 1;
    }

    /// Get the current value
    pub fn get(&self) -> u64 {
        *self.value.read().unwrap()
    }
}

/// Counters for every degraded path in the routing engine
#[derive(Debug, Clone)]
pub struct RoutingMetrics {
    /// Conditions evaluated with an operator this engine does not know
    pub unknown_operator: Counter,
    /// Regex conditions whose pattern failed to compile
    pub invalid_regex: Counter,
    /// Balancer reservations that lost a compare-and-swap race
    pub balancer_conflicts: Counter,
    /// Balancer calls that exhausted retries and fell back to the first
    /// eligible user
    pub balancer_degraded: Counter,
    /// Audit notifications that failed (never propagated)
    pub audit_failures: Counter,
}

impl RoutingMetrics {
    /// Create a fresh set of counters
    pub fn new() -> Self {
        Self {
            unknown_operator: Counter::new("routing_unknown_operator_total"),
            invalid_regex: Counter::new("routing_invalid_regex_total"),
            balancer_conflicts: Counter::new("routing_balancer_conflicts_total"),
            balancer_degraded: Counter::new("routing_balancer_degraded_total"),
            audit_failures: Counter::new("routing_audit_failures_total"),
        }
    }

    /// Snapshot all counters by name
    pub fn snapshot(&self) -> HashMap<&'static str, u64> {
        [
            &self.unknown_operator,
            &self.invalid_regex,
            &self.balancer_conflicts,
            &self.balancer_degraded,
            &self.audit_failures,
        ]
        .into_iter()
        .map(|c| (c.name(), c.get()))
        .collect()
    }
}

impl Default for RoutingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_increments() {
        let counter = Counter::new("test_total");
        assert_eq!(counter.get(), 0);
        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_counter_shared_across_clones() {
        let counter = Counter::new("test_total");
        let clone = counter.clone();
        clone.inc();
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_snapshot() {
        let metrics = RoutingMetrics::new();
        metrics.invalid_regex.inc();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot["routing_invalid_regex_total"], 1);
        assert_eq!(snapshot["routing_unknown_operator_total"], 0);
    }
}
