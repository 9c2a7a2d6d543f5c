//! Routing error types

use leadroute_core::InvalidConditions;
use thiserror::Error;

/// Routing error
#[derive(Error, Debug)]
pub enum RoutingError {
    /// Lead absent from the lead store
    #[error("Lead not found: {0}")]
    LeadNotFound(String),

    /// Target assignee absent from the tenant or inactive
    #[error("Assignee not found: {0}")]
    AssigneeNotFound(String),

    /// Rule absent from the rule store
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    /// The request was valid but the eligible pool is empty
    #[error("No assignee available: {0}")]
    NoAssigneeAvailable(String),

    /// Redistribution has no eligible target user
    #[error("No eligible user for redistribution")]
    NoEligibleUser,

    /// Rule conditions failed authoring-time validation
    #[error(transparent)]
    InvalidRule(#[from] InvalidConditions),

    /// Atomic ownership or workload update lost a race after retries
    #[error("Concurrent assignment conflict on {0}")]
    ConcurrencyConflict(String),

    /// Store I/O failure
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;
