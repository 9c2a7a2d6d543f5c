//! Leadroute Engine - lead routing and assignment
//!
//! This crate decides, for any given lead, which human owner it is routed
//! to. It combines a rule-matching interpreter over tenant-defined
//! conditions, priority-ordered rule resolution with a deterministic
//! tie-break, a contention-safe load-balancing fallback, and an
//! append-only audit trail of every ownership change.
//!
//! Persistence, the user directory, and the audit collaborator are
//! injected behind the traits in [`store`]; in-memory implementations are
//! provided for tests and embedding.

pub mod cancel;
mod commit;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod manual;
pub mod matcher;
pub mod metrics;
pub mod result;
pub mod router;
pub mod rules;
pub mod store;
pub mod workload;

// Re-export main types
pub use cancel::CancelToken;
pub use config::RouterConfig;
pub use error::{Result, RoutingError};
pub use evaluator::ConditionEvaluator;
pub use executor::{AssignmentExecutor, Placement};
pub use manual::ManualAssignmentService;
pub use matcher::RuleMatcher;
pub use metrics::{Counter, RoutingMetrics};
pub use result::{
    AssignmentOutcome, BulkItem, BulkSummary, Recommendation, RedistributionSummary, RoutingStats,
    RuleUsage,
};
pub use router::{LeadRouter, LeadRouterBuilder};
pub use rules::{RuleCache, RuleService};
pub use store::{
    AuditEvent, AuditSink, HistoryStore, InMemoryAuditSink, InMemoryHistoryStore,
    InMemoryLeadStore, InMemoryRuleStore, InMemoryUserDirectory, LeadStore, RuleStore,
    SourceCounts, User, UserDirectory,
};
pub use workload::{InMemoryWorkloadTracker, WorkloadBalancer, WorkloadTracker};
