//! Assignment strategy execution
//!
//! Turns a matched rule into a concrete assignee. Balanced strategies
//! reserve their workload slot here, before the commit, so the reservation
//! and the selection are one atomic step.

use crate::error::Result;
use crate::store::User;
use crate::workload::WorkloadBalancer;
use leadroute_core::{AssignmentDecision, AssignmentRule, AssignmentSource, AssignmentStrategy, Lead};
use std::sync::Arc;

/// A decision plus whether a workload reservation is already held for it
#[derive(Debug, Clone)]
pub struct Placement {
    /// The assignment decision
    pub decision: AssignmentDecision,
    /// True when the balancer reserved a slot for the assignee
    pub reserved: bool,
}

/// Applies a rule's assignment strategy
pub struct AssignmentExecutor {
    balancer: Arc<WorkloadBalancer>,
}

impl AssignmentExecutor {
    /// Create an executor over a balancer
    pub fn new(balancer: Arc<WorkloadBalancer>) -> Self {
        Self { balancer }
    }

    /// Produce a placement for a lead under a rule. Fails with
    /// `NoAssigneeAvailable` when a balanced strategy has nobody to pick.
    pub async fn place(
        &self,
        rule: &AssignmentRule,
        lead: &Lead,
        pool: &[User],
    ) -> Result<Placement> {
        let (source, matched_rule_id) = if rule.is_fallback() {
            (AssignmentSource::Auto, None)
        } else {
            (AssignmentSource::Rule, Some(rule.id.clone()))
        };

        match &rule.strategy {
            AssignmentStrategy::SpecificUser { assigned_to } => Ok(Placement {
                decision: AssignmentDecision {
                    assignee: assigned_to.clone(),
                    source,
                    matched_rule_id,
                },
                reserved: false,
            }),
            AssignmentStrategy::RoundRobin => {
                let assignee = self
                    .balancer
                    .reserve_least_loaded(&lead.tenant_id, pool)
                    .await?;
                Ok(Placement {
                    decision: AssignmentDecision {
                        assignee,
                        source,
                        matched_rule_id,
                    },
                    reserved: true,
                })
            }
            AssignmentStrategy::Team => {
                // Team rosters are not resolved yet; balance over the
                // whole eligible pool until a roster source exists.
                tracing::debug!(
                    rule_id = %rule.id,
                    "Team roster resolution not implemented, balancing whole pool"
                );
                let assignee = self
                    .balancer
                    .reserve_least_loaded(&lead.tenant_id, pool)
                    .await?;
                Ok(Placement {
                    decision: AssignmentDecision {
                        assignee,
                        source,
                        matched_rule_id,
                    },
                    reserved: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoutingError;
    use crate::metrics::RoutingMetrics;
    use crate::workload::InMemoryWorkloadTracker;
    use std::time::Duration;

    fn executor() -> AssignmentExecutor {
        let balancer = WorkloadBalancer::new(
            Arc::new(InMemoryWorkloadTracker::new()),
            RoutingMetrics::new(),
            3,
            Duration::from_millis(1),
        );
        AssignmentExecutor::new(Arc::new(balancer))
    }

    fn pool(ids: &[&str]) -> Vec<User> {
        ids.iter().map(|id| User::new(*id, *id, "sales")).collect()
    }

    fn lead() -> Lead {
        Lead::new("l1", "acme")
    }

    #[tokio::test]
    async fn test_specific_user_skips_balancing() {
        let rule = AssignmentRule::new(
            "r1",
            "Direct",
            "acme",
            AssignmentStrategy::SpecificUser {
                assigned_to: "u9".to_string(),
            },
        );

        // empty pool is fine: no balancing happens
        let placement = executor().place(&rule, &lead(), &[]).await.unwrap();
        assert_eq!(placement.decision.assignee, "u9");
        assert_eq!(placement.decision.source, AssignmentSource::Rule);
        assert_eq!(placement.decision.matched_rule_id.as_deref(), Some("r1"));
        assert!(!placement.reserved);
    }

    #[tokio::test]
    async fn test_round_robin_reserves() {
        let rule = AssignmentRule::new("r1", "RR", "acme", AssignmentStrategy::RoundRobin);
        let placement = executor()
            .place(&rule, &lead(), &pool(&["u1", "u2"]))
            .await
            .unwrap();
        assert!(placement.reserved);
        assert_eq!(placement.decision.source, AssignmentSource::Rule);
    }

    #[tokio::test]
    async fn test_team_balances_whole_pool() {
        let rule = AssignmentRule::new("r1", "Team", "acme", AssignmentStrategy::Team);
        let placement = executor()
            .place(&rule, &lead(), &pool(&["u1"]))
            .await
            .unwrap();
        assert_eq!(placement.decision.assignee, "u1");
        assert!(placement.reserved);
    }

    #[tokio::test]
    async fn test_fallback_rule_is_auto_source() {
        let fallback = AssignmentRule::fallback("acme");
        let placement = executor()
            .place(&fallback, &lead(), &pool(&["u1"]))
            .await
            .unwrap();
        assert_eq!(placement.decision.source, AssignmentSource::Auto);
        assert!(placement.decision.matched_rule_id.is_none());
    }

    #[tokio::test]
    async fn test_empty_pool_surfaces_no_assignee() {
        let rule = AssignmentRule::new("r1", "RR", "acme", AssignmentStrategy::RoundRobin);
        let err = executor().place(&rule, &lead(), &[]).await.unwrap_err();
        assert!(matches!(err, RoutingError::NoAssigneeAvailable(_)));
    }
}
