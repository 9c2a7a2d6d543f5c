//! Router configuration

use std::time::Duration;

/// Behavior knobs for the routing engine, supplied by the embedding
/// application
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Roles excluded from the eligible pool. Tenant policy, not engine
    /// policy; the default mirrors the common "keep admins out of the
    /// rotation" setup.
    pub excluded_roles: Vec<String>,

    /// How many times a lost workload reservation is retried before the
    /// balancer degrades to the first eligible user
    pub balancer_max_retries: u32,

    /// Base interval for the balancer's exponential backoff
    pub balancer_backoff: Duration,

    /// Upper bound on leads moved by one redistribution pass
    pub redistribute_batch_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            excluded_roles: vec!["admin".to_string()],
            balancer_max_retries: 5,
            balancer_backoff: Duration::from_millis(10),
            redistribute_batch_size: 10,
        }
    }
}
