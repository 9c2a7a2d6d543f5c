//! Rule matching against leads
//!
//! Matching is deterministic: rules are ordered by priority (descending),
//! then creation time (ascending, oldest wins a tie), then id, giving a
//! total order independent of input ordering.

use crate::evaluator::ConditionEvaluator;
use leadroute_core::{AssignmentRule, Lead};

/// Finds the highest-priority active rule whose conditions all hold
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    evaluator: ConditionEvaluator,
}

impl RuleMatcher {
    /// Create a matcher with the given evaluator
    pub fn new(evaluator: ConditionEvaluator) -> Self {
        Self { evaluator }
    }

    /// The evaluator used for condition tests
    pub fn evaluator(&self) -> &ConditionEvaluator {
        &self.evaluator
    }

    /// Find the best matching rule, or `None` if no active rule matches.
    /// An empty condition map matches trivially; conditions on fields the
    /// lead does not carry evaluate against an absent value.
    pub fn best_match<'a>(
        &self,
        lead: &Lead,
        rules: &'a [AssignmentRule],
    ) -> Option<&'a AssignmentRule> {
        let mut active: Vec<&AssignmentRule> = rules.iter().filter(|r| r.is_active).collect();
        active.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        active.into_iter().find(|rule| self.matches(lead, rule))
    }

    /// Whether every condition of a single rule holds for the lead
    pub fn matches(&self, lead: &Lead, rule: &AssignmentRule) -> bool {
        rule.conditions
            .iter()
            .all(|(field, condition)| self.evaluator.evaluate(lead.field(field), condition))
    }
}
