//! Lead ownership and assignment decision types

use crate::types::Value;
use crate::{LeadId, RuleId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where an ownership change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    /// Explicit human-directed assignment
    Manual,
    /// A configured rule matched
    Rule,
    /// Fallback round-robin when no rule matched
    Auto,
}

impl AssignmentSource {
    /// Wire name of the source
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentSource::Manual => "manual",
            AssignmentSource::Rule => "rule",
            AssignmentSource::Auto => "auto",
        }
    }
}

/// The ownership fields of a lead, the only part of a lead this engine
/// ever writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ownership {
    /// Current owner
    pub assigned_to: UserId,
    /// When ownership was set
    pub assigned_at: DateTime<Utc>,
    /// How ownership was set
    pub source: AssignmentSource,
    /// Rule that produced the assignment, when `source` is `Rule`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<RuleId>,
}

/// A lead record as the routing engine sees it: an arbitrary field map
/// plus ownership. Business fields are read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Lead identifier
    pub id: LeadId,
    /// Scoping key
    pub tenant_id: TenantId,
    /// Arbitrary field → value record
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    /// Current ownership, `None` while unassigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<Ownership>,
}

impl Lead {
    /// Create an unassigned lead
    pub fn new(id: impl Into<LeadId>, tenant_id: impl Into<TenantId>) -> Self {
        Lead {
            id: id.into(),
            tenant_id: tenant_id.into(),
            fields: HashMap::new(),
            ownership: None,
        }
    }

    /// Set a business field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a business field referenced by a condition
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Current owner, if any
    pub fn assigned_to(&self) -> Option<&UserId> {
        self.ownership.as_ref().map(|o| &o.assigned_to)
    }
}

/// The outcome of one routing call: who the lead goes to and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDecision {
    /// Selected owner
    pub assignee: UserId,
    /// How the owner was chosen
    pub source: AssignmentSource,
    /// Rule that matched, absent for manual and fallback assignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<RuleId>,
}
