//! Assignment rule definitions

use crate::condition::{Condition, ConditionOperator};
use crate::types::Value;
use crate::{RuleId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a matched rule selects an owner
///
/// Modeled as a closed tagged union so that the `specific_user` strategy
/// cannot exist without its target user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "assignment_type", rename_all = "snake_case")]
pub enum AssignmentStrategy {
    /// Route directly to one user, no balancing
    SpecificUser {
        /// Target user
        assigned_to: UserId,
    },
    /// Balance across the whole eligible pool by open-lead count
    RoundRobin,
    /// Balance across a team roster. Roster resolution is not wired up
    /// yet; the executor balances over the whole eligible pool and logs
    /// that teams are unsupported.
    Team,
}

impl AssignmentStrategy {
    /// Wire name of the strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStrategy::SpecificUser { .. } => "specific_user",
            AssignmentStrategy::RoundRobin => "round_robin",
            AssignmentStrategy::Team => "team",
        }
    }
}

/// Tenant-defined routing rule: a flat AND-combined condition map plus an
/// assignment strategy and priority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRule {
    /// Unique rule ID within the tenant
    pub id: RuleId,

    /// Human-readable name
    pub name: String,

    /// Field name → condition, AND-combined; empty matches everything
    #[serde(default)]
    pub conditions: BTreeMap<String, Condition>,

    /// How a match turns into an owner
    #[serde(flatten)]
    pub strategy: AssignmentStrategy,

    /// Inactive rules are skipped by the matcher
    pub is_active: bool,

    /// Higher priority evaluated first
    pub priority: i32,

    /// Scoping key
    pub tenant_id: TenantId,

    /// Tie-break key when two rules share a priority (oldest wins)
    pub created_at: DateTime<Utc>,
}

impl AssignmentRule {
    /// Create a new active rule
    pub fn new(
        id: impl Into<RuleId>,
        name: impl Into<String>,
        tenant_id: impl Into<TenantId>,
        strategy: AssignmentStrategy,
    ) -> Self {
        AssignmentRule {
            id: id.into(),
            name: name.into(),
            conditions: BTreeMap::new(),
            strategy,
            is_active: true,
            priority: 1,
            tenant_id: tenant_id.into(),
            created_at: Utc::now(),
        }
    }

    /// Add a condition on a lead field
    pub fn with_condition(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(field.into(), condition);
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Set the creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// The synthetic lowest-priority rule applied when nothing configured
    /// matches: round-robin over the whole eligible pool.
    pub fn fallback(tenant_id: impl Into<TenantId>) -> Self {
        AssignmentRule {
            id: "fallback".to_string(),
            name: "Round-robin fallback".to_string(),
            conditions: BTreeMap::new(),
            strategy: AssignmentStrategy::RoundRobin,
            is_active: true,
            priority: i32::MIN,
            tenant_id: tenant_id.into(),
            created_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Whether this rule is the synthetic fallback
    pub fn is_fallback(&self) -> bool {
        self.priority == i32::MIN && self.id == "fallback"
    }

    /// Starter rule set a tenant can seed its configuration from
    pub fn starter_rules(tenant_id: &str) -> Vec<AssignmentRule> {
        vec![
            AssignmentRule::new("high_value_leads", "High Value Leads", tenant_id,
                AssignmentStrategy::RoundRobin)
                .with_condition(
                    "deal_value",
                    Condition::new(ConditionOperator::GreaterThan, Value::Number(10000.0)),
                )
                .with_priority(10),
            AssignmentRule::new("enterprise_leads", "Enterprise Leads", tenant_id,
                AssignmentStrategy::Team)
                .with_condition(
                    "company",
                    Condition::new(ConditionOperator::Contains, Value::from("enterprise")),
                )
                .with_priority(8),
            AssignmentRule::new("hot_leads", "Hot Leads", tenant_id,
                AssignmentStrategy::RoundRobin)
                .with_condition(
                    "lead_score",
                    Condition::new(ConditionOperator::GreaterThan, Value::Number(80.0)),
                )
                .with_priority(6),
            AssignmentRule::new("default_assignment", "Default Assignment", tenant_id,
                AssignmentStrategy::RoundRobin)
                .with_condition("source", Condition::bare(ConditionOperator::IsNotEmpty))
                .with_priority(1),
        ]
    }
}
