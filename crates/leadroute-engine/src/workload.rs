//! Workload tracking and load balancing
//!
//! Workload (open-lead count per user) is an injected capability rather
//! than a table re-scan: the balancer reads counts and reserves a slot in
//! one atomic step per user, so two concurrent routing calls cannot both
//! select the same minimally-loaded user. A lost reservation retries with
//! bounded backoff and, when retries run out, degrades to the first
//! eligible user so routing stays available.

use crate::error::{Result, RoutingError};
use crate::metrics::RoutingMetrics;
use crate::store::User;
use async_trait::async_trait;
use leadroute_core::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Atomic per-user open-lead counters
#[async_trait]
pub trait WorkloadTracker: Send + Sync {
    /// Current open-lead counts for the given users; users with no
    /// recorded assignments count as zero
    async fn open_counts(&self, tenant: &str, users: &[UserId]) -> Result<HashMap<UserId, u64>>;

    /// Compare-and-swap increment: reserve one slot for `user` only if
    /// their count still equals `observed`. Returns whether the
    /// reservation won.
    async fn try_acquire(&self, tenant: &str, user: &str, observed: u64) -> Result<bool>;

    /// Unconditional increment, used by the degraded path and by commits
    /// that bypass balancing (specific-user and manual assignment)
    async fn acquire(&self, tenant: &str, user: &str) -> Result<()>;

    /// Decrement on rollback or when a lead changes owner
    async fn release(&self, tenant: &str, user: &str) -> Result<()>;
}

/// In-memory workload tracker; the compare-and-swap runs under one write
/// lock per call
#[derive(Default)]
pub struct InMemoryWorkloadTracker {
    counts: RwLock<HashMap<(String, String), u64>>,
}

impl InMemoryWorkloadTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's count
    pub async fn set_count(&self, tenant: &str, user: &str, count: u64) {
        let mut counts = self.counts.write().await;
        counts.insert((tenant.to_string(), user.to_string()), count);
    }
}

#[async_trait]
impl WorkloadTracker for InMemoryWorkloadTracker {
    async fn open_counts(&self, tenant: &str, users: &[UserId]) -> Result<HashMap<UserId, u64>> {
        let counts = self.counts.read().await;
        Ok(users
            .iter()
            .map(|user| {
                let count = counts
                    .get(&(tenant.to_string(), user.clone()))
                    .copied()
                    .unwrap_or(0);
                (user.clone(), count)
            })
            .collect())
    }

    async fn try_acquire(&self, tenant: &str, user: &str, observed: u64) -> Result<bool> {
        let mut counts = self.counts.write().await;
        let key = (tenant.to_string(), user.to_string());
        let current = counts.get(&key).copied().unwrap_or(0);
        if current != observed {
            return Ok(false);
        }
        counts.insert(key, current + 1);
        Ok(true)
    }

    async fn acquire(&self, tenant: &str, user: &str) -> Result<()> {
        let mut counts = self.counts.write().await;
        *counts
            .entry((tenant.to_string(), user.to_string()))
            .or_insert(0) += 1;
        Ok(())
    }

    async fn release(&self, tenant: &str, user: &str) -> Result<()> {
        let mut counts = self.counts.write().await;
        let key = (tenant.to_string(), user.to_string());
        if let Some(count) = counts.get_mut(&key) {
            *count = count.saturating_sub(1);
        }
        Ok(())
    }
}

/// Chooses the least-loaded user from an eligible pool and reserves a
/// slot for them
pub struct WorkloadBalancer {
    tracker: Arc<dyn WorkloadTracker>,
    metrics: RoutingMetrics,
    max_retries: u32,
    backoff_base: Duration,
}

impl WorkloadBalancer {
    /// Create a balancer over a tracker
    pub fn new(
        tracker: Arc<dyn WorkloadTracker>,
        metrics: RoutingMetrics,
        max_retries: u32,
        backoff_base: Duration,
    ) -> Self {
        Self {
            tracker,
            metrics,
            max_retries,
            backoff_base,
        }
    }

    /// The tracker behind this balancer
    pub fn tracker(&self) -> &Arc<dyn WorkloadTracker> {
        &self.tracker
    }

    /// Select the least-loaded user and atomically reserve a slot for
    /// them. Ties break on user id ascending so repeated calls with the
    /// same state are deterministic.
    pub async fn reserve_least_loaded(&self, tenant: &str, pool: &[User]) -> Result<UserId> {
        if pool.is_empty() {
            return Err(RoutingError::NoAssigneeAvailable(
                "eligible pool is empty".to_string(),
            ));
        }
        let ids: Vec<UserId> = pool.iter().map(|u| u.id.clone()).collect();

        for attempt in 0..=self.max_retries {
            let counts = self.tracker.open_counts(tenant, &ids).await?;
            let Some((candidate, observed)) = least_loaded(&ids, &counts) else {
                return Err(RoutingError::NoAssigneeAvailable(
                    "eligible pool is empty".to_string(),
                ));
            };

            if self.tracker.try_acquire(tenant, &candidate, observed).await? {
                return Ok(candidate);
            }

            self.metrics.balancer_conflicts.inc();
            tracing::debug!(
                tenant,
                user = %candidate,
                attempt,
                "Lost workload reservation race, retrying"
            );
            tokio::time::sleep(self.backoff(attempt)).await;
        }

        // Degraded but available: take the first eligible user without the
        // compare-and-swap. Distribution may skew momentarily; routing
        // keeps working.
        let fallback = ids
            .iter()
            .min()
            .cloned()
            .ok_or_else(|| RoutingError::NoAssigneeAvailable("eligible pool is empty".to_string()))?;
        self.tracker.acquire(tenant, &fallback).await?;
        self.metrics.balancer_degraded.inc();
        tracing::warn!(
            tenant,
            user = %fallback,
            retries = self.max_retries,
            "Workload reservation kept losing races, degrading to first eligible user"
        );
        Ok(fallback)
    }

    /// Exponential backoff, capped so a contended tenant never waits
    /// more than sixteen base intervals
    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt.min(4))
    }

    /// Select the least-loaded user without reserving, for
    /// recommendations
    pub async fn peek_least_loaded(&self, tenant: &str, pool: &[User]) -> Result<UserId> {
        if pool.is_empty() {
            return Err(RoutingError::NoAssigneeAvailable(
                "eligible pool is empty".to_string(),
            ));
        }
        let ids: Vec<UserId> = pool.iter().map(|u| u.id.clone()).collect();
        let counts = self.tracker.open_counts(tenant, &ids).await?;
        let (candidate, _) = least_loaded(&ids, &counts).ok_or_else(|| {
            RoutingError::NoAssigneeAvailable("eligible pool is empty".to_string())
        })?;
        Ok(candidate)
    }
}

/// Minimum count, ties broken by user id ascending; `None` for an empty
/// pool
pub(crate) fn least_loaded(ids: &[UserId], counts: &HashMap<UserId, u64>) -> Option<(UserId, u64)> {
    let (first, rest) = ids.split_first()?;
    let mut best = (first, counts.get(first).copied().unwrap_or(0));
    for id in rest {
        let count = counts.get(id).copied().unwrap_or(0);
        if count < best.1 || (count == best.1 && id < best.0) {
            best = (id, count);
        }
    }
    Some((best.0.clone(), best.1))
}
