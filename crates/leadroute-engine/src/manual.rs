//! Human-directed assignment: explicit assign/reassign, bulk assignment,
//! and workload redistribution
//!
//! Manual operations bypass rule matching but write through the same
//! commit path as auto-routing, so every ownership change in the system
//! lands in the history exactly the same way.

use crate::cancel::CancelToken;
use crate::commit::{ClaimMode, CommitOutcome, CommitRequest, OwnershipWriter};
use crate::config::RouterConfig;
use crate::error::{Result, RoutingError};
use crate::result::{BulkItem, BulkSummary, RedistributionSummary};
use crate::rules::notify_audit;
use crate::metrics::RoutingMetrics;
use crate::store::{AuditEvent, AuditSink, HistoryStore, LeadStore, UserDirectory};
use crate::workload::{least_loaded, WorkloadTracker};
use leadroute_core::{AssignmentDecision, AssignmentSource, Lead, UserId};
use std::sync::Arc;

const DEFAULT_ASSIGN_REASON: &str = "Manual assignment";
const DEFAULT_REASSIGN_REASON: &str = "Manual reassignment";
const REDISTRIBUTE_REASON: &str = "Workload redistribution";

/// Explicit assignment service
pub struct ManualAssignmentService {
    users: Arc<dyn UserDirectory>,
    leads: Arc<dyn LeadStore>,
    workload: Arc<dyn WorkloadTracker>,
    writer: OwnershipWriter,
    audit: Arc<dyn AuditSink>,
    metrics: RoutingMetrics,
    config: RouterConfig,
}

impl ManualAssignmentService {
    /// Create the service over its collaborators
    pub fn new(
        users: Arc<dyn UserDirectory>,
        leads: Arc<dyn LeadStore>,
        history: Arc<dyn HistoryStore>,
        workload: Arc<dyn WorkloadTracker>,
        audit: Arc<dyn AuditSink>,
        metrics: RoutingMetrics,
        config: RouterConfig,
    ) -> Self {
        Self {
            users,
            leads: leads.clone(),
            workload: workload.clone(),
            writer: OwnershipWriter::new(leads, history, workload),
            audit,
            metrics,
            config,
        }
    }

    /// Assign a lead to a user, overwriting any current owner
    pub async fn assign(
        &self,
        lead_id: &str,
        assignee: &str,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        self.assign_with_reason(lead_id, assignee, actor, reason.unwrap_or(DEFAULT_ASSIGN_REASON))
            .await
    }

    /// Reassign a lead to a different user; same contract as [`assign`]
    /// with a different default reason
    ///
    /// [`assign`]: ManualAssignmentService::assign
    pub async fn reassign(
        &self,
        lead_id: &str,
        new_assignee: &str,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        self.assign_with_reason(
            lead_id,
            new_assignee,
            actor,
            reason.unwrap_or(DEFAULT_REASSIGN_REASON),
        )
        .await
    }

    /// Assign many leads to one user; per-lead failures are isolated
    pub async fn bulk_assign(
        &self,
        lead_ids: &[String],
        assignee: &str,
        actor: &str,
        reason: Option<&str>,
        cancel: &CancelToken,
    ) -> BulkSummary<()> {
        let reason = reason.unwrap_or("Bulk assignment");
        let mut results = Vec::with_capacity(lead_ids.len());
        let mut cancelled = false;

        for lead_id in lead_ids {
            if cancel.is_cancelled() {
                cancelled = true;
                tracing::info!(
                    remaining = lead_ids.len() - results.len(),
                    "Bulk assignment cancelled"
                );
                break;
            }
            let result = self
                .assign_with_reason(lead_id, assignee, actor, reason)
                .await
                .map_err(|e| e.to_string());
            results.push(BulkItem {
                lead_id: lead_id.clone(),
                result,
            });
        }

        BulkSummary::from_results(results, cancelled)
    }

    /// Move a bounded batch of unassigned leads to the least-loaded
    /// eligible user. A greedy pass over unassigned leads only; leads
    /// that already have an owner are never touched. The token stops the
    /// pass between leads.
    pub async fn redistribute(
        &self,
        tenant: &str,
        actor: &str,
        cancel: &CancelToken,
    ) -> Result<RedistributionSummary> {
        let pool = self
            .users
            .list_eligible(tenant, &self.config.excluded_roles)
            .await?;
        if pool.is_empty() {
            return Err(RoutingError::NoEligibleUser);
        }

        let ids: Vec<UserId> = pool.iter().map(|u| u.id.clone()).collect();
        let counts = self.workload.open_counts(tenant, &ids).await?;
        let Some((target, _)) = least_loaded(&ids, &counts) else {
            return Err(RoutingError::NoEligibleUser);
        };

        let lead_ids = self
            .leads
            .list_unassigned(tenant, self.config.redistribute_batch_size)
            .await?;

        let mut results = Vec::with_capacity(lead_ids.len());
        let mut cancelled = false;
        for lead_id in &lead_ids {
            if cancel.is_cancelled() {
                cancelled = true;
                tracing::info!(
                    remaining = lead_ids.len() - results.len(),
                    "Redistribution cancelled"
                );
                break;
            }
            let result = self
                .redistribute_one(lead_id, &target, actor)
                .await
                .map_err(|e| e.to_string());
            results.push(BulkItem {
                lead_id: lead_id.clone(),
                result,
            });
        }

        let moved = results.iter().filter(|r| r.result.is_ok()).count();
        tracing::info!(tenant, target = %target, moved, cancelled, "Redistribution pass finished");
        Ok(RedistributionSummary {
            target_user: target,
            moved,
            cancelled,
            results,
        })
    }

    async fn assign_with_reason(
        &self,
        lead_id: &str,
        assignee: &str,
        actor: &str,
        reason: &str,
    ) -> Result<()> {
        let lead = self.fetch_lead(lead_id).await?;

        if !self.users.exists(assignee, &lead.tenant_id).await? {
            return Err(RoutingError::AssigneeNotFound(assignee.to_string()));
        }

        let decision = AssignmentDecision {
            assignee: assignee.to_string(),
            source: AssignmentSource::Manual,
            matched_rule_id: None,
        };

        self.writer
            .commit(CommitRequest {
                lead: &lead,
                decision: &decision,
                actor: Some(actor),
                reason: reason.to_string(),
                mode: ClaimMode::ReplaceObserved,
                reserved: false,
            })
            .await?;

        notify_audit(
            self.audit.clone(),
            self.metrics.clone(),
            AuditEvent::LeadAssigned {
                lead_id: lead_id.to_string(),
                assignee: assignee.to_string(),
                actor: Some(actor.to_string()),
            },
        );
        Ok(())
    }

    /// Claim one still-unassigned lead for the redistribution target;
    /// losing the claim means someone else took the lead meanwhile, which
    /// is reported as a per-lead failure, not a batch abort
    async fn redistribute_one(&self, lead_id: &str, target: &str, actor: &str) -> Result<()> {
        let lead = self.fetch_lead(lead_id).await?;
        let decision = AssignmentDecision {
            assignee: target.to_string(),
            source: AssignmentSource::Manual,
            matched_rule_id: None,
        };

        let outcome = self
            .writer
            .commit(CommitRequest {
                lead: &lead,
                decision: &decision,
                actor: Some(actor),
                reason: REDISTRIBUTE_REASON.to_string(),
                mode: ClaimMode::UnassignedOnly,
                reserved: false,
            })
            .await?;

        match outcome {
            CommitOutcome::Committed => Ok(()),
            CommitOutcome::LostClaim => Err(RoutingError::ConcurrencyConflict(lead_id.to_string())),
        }
    }

    async fn fetch_lead(&self, lead_id: &str) -> Result<Lead> {
        self.leads
            .get(lead_id)
            .await?
            .ok_or_else(|| RoutingError::LeadNotFound(lead_id.to_string()))
    }
}
