//! The commit step: ownership mutation plus history append as one unit
//!
//! Every ownership change in the system, auto or manual, funnels through
//! [`OwnershipWriter::commit`]. That gives the engine exactly one
//! history-append code path, and one place where the rollback rule lives:
//! if the history write fails, the ownership mutation is undone and the
//! call fails with nothing applied.

use crate::error::{Result, RoutingError};
use crate::store::{HistoryStore, LeadStore};
use crate::workload::WorkloadTracker;
use chrono::Utc;
use leadroute_core::{AssignmentDecision, AssignmentHistoryEntry, Lead, Ownership};
use std::sync::Arc;
use uuid::Uuid;

/// How the ownership write competes with concurrent writers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClaimMode {
    /// Only claim a lead that is still unassigned (auto-routing; losing
    /// the race is a benign no-op)
    UnassignedOnly,
    /// Replace whatever owner was observed when the lead was read
    /// (manual assignment; losing the race is a conflict)
    ReplaceObserved,
}

/// What a commit attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommitOutcome {
    /// Ownership and history were both written
    Committed,
    /// Another writer claimed the lead first; nothing was written
    LostClaim,
}

/// One commit request
pub(crate) struct CommitRequest<'a> {
    pub lead: &'a Lead,
    pub decision: &'a AssignmentDecision,
    pub actor: Option<&'a str>,
    pub reason: String,
    pub mode: ClaimMode,
    /// Whether the balancer already reserved a workload slot for the
    /// assignee; when false the commit acquires one itself
    pub reserved: bool,
}

/// Writes ownership changes and their history entries
pub(crate) struct OwnershipWriter {
    leads: Arc<dyn LeadStore>,
    history: Arc<dyn HistoryStore>,
    workload: Arc<dyn WorkloadTracker>,
}

impl OwnershipWriter {
    pub(crate) fn new(
        leads: Arc<dyn LeadStore>,
        history: Arc<dyn HistoryStore>,
        workload: Arc<dyn WorkloadTracker>,
    ) -> Self {
        Self {
            leads,
            history,
            workload,
        }
    }

    pub(crate) async fn commit(&self, request: CommitRequest<'_>) -> Result<CommitOutcome> {
        let lead = request.lead;
        let tenant = lead.tenant_id.as_str();
        let previous = lead.ownership.clone();
        let previous_owner = previous.as_ref().map(|o| o.assigned_to.clone());

        let ownership = Ownership {
            assigned_to: request.decision.assignee.clone(),
            assigned_at: Utc::now(),
            source: request.decision.source,
            rule_id: request.decision.matched_rule_id.clone(),
        };

        let expected = match request.mode {
            ClaimMode::UnassignedOnly => None,
            ClaimMode::ReplaceObserved => previous_owner.as_deref(),
        };

        let claimed = match self.leads.claim(&lead.id, expected, ownership).await {
            Ok(claimed) => claimed,
            Err(err) => {
                // a failed claim wrote nothing; the reservation must not
                // outlive the attempt or the count drifts from ownership
                if request.reserved {
                    self.release_reservation(tenant, &request.decision.assignee).await;
                }
                return Err(err);
            }
        };

        if !claimed {
            if request.reserved {
                self.release_reservation(tenant, &request.decision.assignee).await;
            }
            return match request.mode {
                ClaimMode::UnassignedOnly => {
                    tracing::debug!(lead_id = %lead.id, "Lead was claimed concurrently, skipping");
                    Ok(CommitOutcome::LostClaim)
                }
                ClaimMode::ReplaceObserved => {
                    Err(RoutingError::ConcurrencyConflict(lead.id.clone()))
                }
            };
        }

        let entry = AssignmentHistoryEntry {
            id: Uuid::new_v4().to_string(),
            lead_id: lead.id.clone(),
            previous_assignee: previous_owner.clone(),
            new_assignee: request.decision.assignee.clone(),
            actor: request.actor.map(str::to_string),
            reason: request.reason,
            created_at: Utc::now(),
        };

        if let Err(err) = self.history.append(entry).await {
            // No partial ownership change survives a history-write
            // failure: restore the previous owner before surfacing.
            tracing::warn!(lead_id = %lead.id, error = %err, "History append failed, rolling back ownership");
            if let Err(rollback_err) = self.leads.set_ownership(&lead.id, previous).await {
                tracing::error!(
                    lead_id = %lead.id,
                    error = %rollback_err,
                    "Ownership rollback failed after history error"
                );
            }
            if request.reserved {
                self.release_reservation(tenant, &request.decision.assignee).await;
            }
            return Err(err);
        }

        // Workload bookkeeping follows a successful commit. The balanced
        // paths reserved their slot up front; everything else acquires
        // here, and a replaced owner gives their slot back.
        if previous_owner.as_deref() != Some(request.decision.assignee.as_str()) {
            if !request.reserved {
                self.workload
                    .acquire(tenant, &request.decision.assignee)
                    .await?;
            }
            if let Some(prev) = &previous_owner {
                self.workload.release(tenant, prev).await?;
            }
        } else if request.reserved {
            // reassignment to the current owner with a reservation held:
            // net workload change is zero
            self.workload
                .release(tenant, &request.decision.assignee)
                .await?;
        }

        Ok(CommitOutcome::Committed)
    }

    /// Give back a slot the balancer reserved for an assignment that did
    /// not stick. Best-effort: the caller is already surfacing an error
    /// and this must not mask it.
    async fn release_reservation(&self, tenant: &str, user: &str) {
        if let Err(err) = self.workload.release(tenant, user).await {
            tracing::warn!(user, error = %err, "Failed to release workload reservation");
        }
    }
}
