//! Result types returned by the routing surface

use crate::store::SourceCounts;
use leadroute_core::{AssignmentDecision, LeadId, RuleId, UserId};
use serde::{Deserialize, Serialize};

/// Outcome of one auto-assignment call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    /// The lead was routed and committed
    Assigned(AssignmentDecision),
    /// The lead already had an owner; nothing was changed
    AlreadyAssigned {
        /// The existing owner
        assignee: UserId,
    },
}

impl AssignmentOutcome {
    /// The owner after the call, regardless of which variant
    pub fn assignee(&self) -> &UserId {
        match self {
            AssignmentOutcome::Assigned(decision) => &decision.assignee,
            AssignmentOutcome::AlreadyAssigned { assignee } => assignee,
        }
    }
}

/// Per-lead result inside a batch; errors are carried as strings so one
/// lead's failure never aborts its siblings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItem<T> {
    /// The lead this entry is about
    pub lead_id: LeadId,
    /// Success payload or the failure message
    pub result: Result<T, String>,
}

/// Aggregate over a batch operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSummary<T> {
    /// Number of successful items
    pub succeeded: usize,
    /// Number of failed items
    pub failed: usize,
    /// Whether the batch stopped early on cancellation
    pub cancelled: bool,
    /// Per-lead detail
    pub results: Vec<BulkItem<T>>,
}

impl<T> BulkSummary<T> {
    /// Build a summary from per-lead results
    pub fn from_results(results: Vec<BulkItem<T>>, cancelled: bool) -> Self {
        let succeeded = results.iter().filter(|r| r.result.is_ok()).count();
        let failed = results.len() - succeeded;
        Self {
            succeeded,
            failed,
            cancelled,
            results,
        }
    }
}

/// One ranked assignment recommendation for a lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Matching rule
    pub rule_id: RuleId,
    /// Matching rule's name
    pub rule_name: String,
    /// Who the rule would assign right now
    pub candidate: UserId,
    /// Rule priority scaled to a confidence score
    pub confidence: f64,
}

/// Usage of one rule across currently-assigned leads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleUsage {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub count: u64,
}

/// Aggregate routing statistics for a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingStats {
    /// Lead counts by assignment source
    pub counts: SourceCounts,
    /// Per-rule usage, most used first
    pub rule_usage: Vec<RuleUsage>,
}

/// Outcome of one redistribution pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedistributionSummary {
    /// The user who received the batch
    pub target_user: UserId,
    /// Leads successfully moved
    pub moved: usize,
    /// Whether the pass stopped early on cancellation
    pub cancelled: bool,
    /// Per-lead detail
    pub results: Vec<BulkItem<()>>,
}
