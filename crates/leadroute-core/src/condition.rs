//! Condition definitions for assignment rules
//!
//! A condition is a single field/operator/expected-value test. Rules carry
//! a flat field → condition map that is AND-combined; there is no nesting
//! or OR support in the rule model (a deliberate limitation, not a gap).

use crate::types::Value;
use serde::{Deserialize, Serialize};

/// Condition operators
///
/// The `Unknown` variant absorbs operators this engine does not recognize
/// so that stored configuration written by a newer (or buggy) authoring
/// surface still deserializes; evaluation treats it as a non-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Strict equality on the raw value
    Equals,
    /// Strict inequality on the raw value
    NotEquals,
    /// Case-insensitive substring test
    Contains,
    /// Negated case-insensitive substring test
    NotContains,
    /// Case-insensitive prefix test
    StartsWith,
    /// Case-insensitive suffix test
    EndsWith,
    /// Membership in an expected list
    In,
    /// Negated membership in an expected list
    NotIn,
    /// Numeric comparison after coercion
    GreaterThan,
    /// Numeric comparison after coercion
    LessThan,
    /// Numeric comparison after coercion
    GreaterThanOrEqual,
    /// Numeric comparison after coercion
    LessThanOrEqual,
    /// Value is null, missing, or the empty string
    IsEmpty,
    /// Negation of `IsEmpty`
    IsNotEmpty,
    /// Case-insensitive regular expression match
    Regex,
    /// Unrecognized operator, never matches
    #[serde(other)]
    Unknown,
}

impl ConditionOperator {
    /// Operators that carry no expected value
    pub fn is_emptiness(&self) -> bool {
        matches!(self, ConditionOperator::IsEmpty | ConditionOperator::IsNotEmpty)
    }

    /// Wire name of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "not_contains",
            ConditionOperator::StartsWith => "starts_with",
            ConditionOperator::EndsWith => "ends_with",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "not_in",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
            ConditionOperator::GreaterThanOrEqual => "greater_than_or_equal",
            ConditionOperator::LessThanOrEqual => "less_than_or_equal",
            ConditionOperator::IsEmpty => "is_empty",
            ConditionOperator::IsNotEmpty => "is_not_empty",
            ConditionOperator::Regex => "regex",
            ConditionOperator::Unknown => "unknown",
        }
    }
}

/// A single field test within a rule's condition map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Comparison operator
    pub operator: ConditionOperator,

    /// Operator-dependent literal; absent for the emptiness operators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

impl Condition {
    /// Create a condition with an expected value
    pub fn new(operator: ConditionOperator, expected: Value) -> Self {
        Condition {
            operator,
            expected: Some(expected),
        }
    }

    /// Create a condition without an expected value (emptiness operators)
    pub fn bare(operator: ConditionOperator) -> Self {
        Condition {
            operator,
            expected: None,
        }
    }
}
