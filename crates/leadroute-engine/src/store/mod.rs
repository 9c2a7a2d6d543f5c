//! Collaborator contracts consumed by the routing engine
//!
//! The engine never talks to a database directly; persistence, the user
//! directory, and the audit trail are injected behind these traits. All
//! operations are async because every one of them is a potential blocking
//! I/O boundary. In-memory implementations live in [`memory`] for tests
//! and embedding.

mod memory;

pub use memory::{
    InMemoryAuditSink, InMemoryHistoryStore, InMemoryLeadStore, InMemoryRuleStore,
    InMemoryUserDirectory,
};

use crate::error::Result;
use async_trait::async_trait;
use leadroute_core::{
    AssignmentHistoryEntry, AssignmentRule, Lead, LeadId, Ownership, RuleId, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A user as the routing engine sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Role name, matched against the caller-supplied exclusion list
    pub role: String,
    /// Inactive users are never eligible
    pub is_active: bool,
}

impl User {
    /// Create an active user
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, role: impl Into<String>) -> Self {
        User {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            is_active: true,
        }
    }
}

/// Aggregate lead counts by assignment source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub total: u64,
    pub assigned: u64,
    pub unassigned: u64,
    pub manual: u64,
    pub rule: u64,
    pub auto: u64,
}

/// Something worth telling the audit collaborator about. Notifications
/// are fire-and-forget; a failed audit never fails the operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A lead changed owner
    LeadAssigned {
        lead_id: LeadId,
        assignee: UserId,
        actor: Option<UserId>,
    },
    /// A rule was created
    RuleCreated { rule_id: RuleId, actor: Option<UserId> },
    /// A rule was updated
    RuleUpdated { rule_id: RuleId, actor: Option<UserId> },
    /// A rule was deleted
    RuleDeleted { rule_id: RuleId, actor: Option<UserId> },
}

/// Storage for assignment rules
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Active rules for a tenant, in any order; the matcher imposes its
    /// own total order
    async fn list_active(&self, tenant: &str) -> Result<Vec<AssignmentRule>>;

    /// Fetch one rule scoped to a tenant
    async fn get(&self, rule_id: &str, tenant: &str) -> Result<Option<AssignmentRule>>;

    /// Persist a new rule
    async fn insert(&self, rule: AssignmentRule) -> Result<()>;

    /// Replace an existing rule
    async fn update(&self, rule: AssignmentRule) -> Result<()>;

    /// Delete a rule; returns whether it existed
    async fn delete(&self, rule_id: &str, tenant: &str) -> Result<bool>;
}

/// The tenant's user roster
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Active users minus the excluded roles. The exclusion list is
    /// tenant policy supplied by the caller, not hard-coded here.
    async fn list_eligible(&self, tenant: &str, excluded_roles: &[String]) -> Result<Vec<User>>;

    /// Whether an active user exists in the tenant
    async fn exists(&self, user_id: &str, tenant: &str) -> Result<bool>;
}

/// Storage for leads. The engine reads business fields and writes only
/// the ownership fields.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Fetch a lead
    async fn get(&self, lead_id: &str) -> Result<Option<Lead>>;

    /// Overwrite a lead's ownership unconditionally; `None` clears it
    async fn set_ownership(&self, lead_id: &str, ownership: Option<Ownership>) -> Result<()>;

    /// Compare-and-swap on the owner: apply `ownership` only when the
    /// current owner equals `expected_owner`. Returns whether the claim
    /// won. Two concurrent claims for the same lead cannot both win.
    async fn claim(
        &self,
        lead_id: &str,
        expected_owner: Option<&str>,
        ownership: Ownership,
    ) -> Result<bool>;

    /// Ids of currently-unassigned leads, up to `limit`
    async fn list_unassigned(&self, tenant: &str, limit: usize) -> Result<Vec<LeadId>>;

    /// Aggregate counts by assignment source
    async fn source_counts(&self, tenant: &str) -> Result<SourceCounts>;

    /// Leads assigned per rule id
    async fn rule_usage_counts(&self, tenant: &str) -> Result<HashMap<RuleId, u64>>;
}

/// Append-only assignment history. Reading it back belongs to reporting
/// collaborators, so no read surface is exposed here.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one entry; entries are never mutated afterwards
    async fn append(&self, entry: AssignmentHistoryEntry) -> Result<()>;
}

/// Audit collaborator, notified after successful manual assignments and
/// rule CRUD
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one audit event
    async fn record(&self, event: AuditEvent) -> Result<()>;
}
