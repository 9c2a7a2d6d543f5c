//! Leadroute Core - Core types for the lead routing and assignment engine
//!
//! This crate provides the fundamental types used across the leadroute
//! ecosystem:
//! - Value types for lead field data
//! - Assignment rule and condition definitions
//! - Assignment decision and history records
//! - Authoring-time condition validation

pub mod condition;
pub mod decision;
pub mod history;
pub mod rule;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use condition::{Condition, ConditionOperator};
pub use decision::{AssignmentDecision, AssignmentSource, Lead, Ownership};
pub use history::AssignmentHistoryEntry;
pub use rule::{AssignmentRule, AssignmentStrategy};
pub use types::Value;
pub use validation::{validate_conditions, InvalidConditions, ValidationReport};

/// Opaque lead identifier
pub type LeadId = String;
/// Opaque user identifier
pub type UserId = String;
/// Opaque rule identifier
pub type RuleId = String;
/// Tenant scoping key
pub type TenantId = String;
