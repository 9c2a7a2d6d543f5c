//! Condition evaluation against lead field values
//!
//! Evaluation never errors: malformed configuration (unknown operators,
//! uncompilable regexes, missing expected values) degrades to a non-match
//! with a warning and a metrics increment, so one bad rule cannot block
//! routing for leads it does not even match.

use crate::metrics::RoutingMetrics;
use leadroute_core::{Condition, ConditionOperator, Value};
use regex::RegexBuilder;

/// Evaluates one field/operator/expected-value triple
#[derive(Debug, Clone, Default)]
pub struct ConditionEvaluator {
    metrics: RoutingMetrics,
}

impl ConditionEvaluator {
    /// Create an evaluator reporting into the given metrics
    pub fn new(metrics: RoutingMetrics) -> Self {
        Self { metrics }
    }

    /// Evaluate a condition against a lead field value. `None` is a field
    /// absent from the lead, which is a legitimate input: it fails every
    /// operator except `is_empty` and `not_equals`.
    pub fn evaluate(&self, value: Option<&Value>, condition: &Condition) -> bool {
        use ConditionOperator::*;

        // A condition without an expected value is malformed for every
        // operator except the emptiness pair. Validation rejects these at
        // authoring time; anything that slipped through is a non-match,
        // including for the negated operators.
        if condition.expected.is_none() && !condition.operator.is_emptiness() {
            tracing::debug!(
                operator = condition.operator.as_str(),
                "Condition has no expected value, treating as non-match"
            );
            return false;
        }

        match condition.operator {
            Equals => self.expected(condition).map_or(false, |e| value == Some(e)),
            NotEquals => self.expected(condition).map_or(false, |e| value != Some(e)),

            Contains => self.text_op(value, condition, |v, e| v.contains(e)),
            NotContains => !self.text_op(value, condition, |v, e| v.contains(e)),
            StartsWith => self.text_op(value, condition, |v, e| v.starts_with(e)),
            EndsWith => self.text_op(value, condition, |v, e| v.ends_with(e)),

            In => match self.expected(condition) {
                Some(Value::Array(items)) => value.map_or(false, |v| items.contains(v)),
                _ => false,
            },
            NotIn => match self.expected(condition) {
                Some(Value::Array(items)) => value.map_or(true, |v| !items.contains(v)),
                _ => true,
            },

            GreaterThan => self.numeric_op(value, condition, |v, e| v > e),
            LessThan => self.numeric_op(value, condition, |v, e| v < e),
            GreaterThanOrEqual => self.numeric_op(value, condition, |v, e| v >= e),
            LessThanOrEqual => self.numeric_op(value, condition, |v, e| v <= e),

            IsEmpty => value.map_or(true, Value::is_empty_value),
            IsNotEmpty => !value.map_or(true, Value::is_empty_value),

            Regex => self.regex_op(value, condition),

            Unknown => {
                tracing::warn!("Unknown condition operator, treating as non-match");
                self.metrics.unknown_operator.inc();
                false
            }
        }
    }

    fn expected<'a>(&self, condition: &'a Condition) -> Option<&'a Value> {
        condition.expected.as_ref()
    }

    /// Case-insensitive string test on the stringified field value
    fn text_op(
        &self,
        value: Option<&Value>,
        condition: &Condition,
        test: impl Fn(&str, &str) -> bool,
    ) -> bool {
        let Some(expected) = self.expected(condition).and_then(Value::as_text) else {
            return false;
        };
        let Some(actual) = value.and_then(Value::as_text) else {
            return false;
        };
        test(&actual.to_lowercase(), &expected.to_lowercase())
    }

    /// Numeric comparison after coercion; non-numeric input on either side
    /// is a non-match, never an error
    fn numeric_op(
        &self,
        value: Option<&Value>,
        condition: &Condition,
        test: impl Fn(f64, f64) -> bool,
    ) -> bool {
        let expected = self.expected(condition).and_then(Value::as_number);
        let actual = value.and_then(Value::as_number);
        match (actual, expected) {
            (Some(v), Some(e)) => test(v, e),
            _ => false,
        }
    }

    fn regex_op(&self, value: Option<&Value>, condition: &Condition) -> bool {
        let Some(pattern) = self.expected(condition).and_then(Value::as_text) else {
            return false;
        };

        let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(regex) => regex,
            Err(err) => {
                tracing::warn!(pattern = %pattern, error = %err, "Invalid regex pattern in condition");
                self.metrics.invalid_regex.inc();
                return false;
            }
        };

        value
            .and_then(Value::as_text)
            .map_or(false, |text| regex.is_match(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadroute_core::Condition;

    fn evaluator() -> ConditionEvaluator {
        ConditionEvaluator::default()
    }

    fn eval(value: Option<Value>, condition: Condition) -> bool {
        evaluator().evaluate(value.as_ref(), &condition)
    }

    #[test]
    fn test_equals_is_strict() {
        let cond = Condition::new(ConditionOperator::Equals, Value::Number(5.0));
        assert!(eval(Some(Value::Number(5.0)), cond.clone()));
        // no coercion for strict equality: "5" != 5
        assert!(!eval(Some(Value::from("5")), cond.clone()));
        assert!(!eval(None, cond));
    }

    #[test]
    fn test_not_equals_on_missing_field() {
        let cond = Condition::new(ConditionOperator::NotEquals, Value::from("web"));
        assert!(eval(None, cond.clone()));
        assert!(eval(Some(Value::from("referral")), cond.clone()));
        assert!(!eval(Some(Value::from("web")), cond));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let cond = Condition::new(ConditionOperator::Contains, Value::from("enterprise"));
        assert!(eval(Some(Value::from("Acme Enterprise Corp")), cond.clone()));
        assert!(!eval(Some(Value::from("Acme Corp")), cond.clone()));
        assert!(!eval(None, cond));
    }

    #[test]
    fn test_not_contains_on_missing_field() {
        let cond = Condition::new(ConditionOperator::NotContains, Value::from("spam"));
        assert!(eval(None, cond.clone()));
        assert!(eval(Some(Value::from("clean")), cond.clone()));
        assert!(!eval(Some(Value::from("SPAM source")), cond));
    }

    #[test]
    fn test_starts_and_ends_with() {
        let starts = Condition::new(ConditionOperator::StartsWith, Value::from("acme"));
        assert!(eval(Some(Value::from("Acme Corp")), starts.clone()));
        assert!(!eval(Some(Value::from("Big Acme")), starts));

        let ends = Condition::new(ConditionOperator::EndsWith, Value::from("corp"));
        assert!(eval(Some(Value::from("Acme CORP")), ends.clone()));
        assert!(!eval(Some(Value::from("Acme Inc")), ends));
    }

    #[test]
    fn test_in_membership() {
        let cond = Condition::new(
            ConditionOperator::In,
            Value::Array(vec![Value::from("web"), Value::from("referral")]),
        );
        assert!(eval(Some(Value::from("web")), cond.clone()));
        assert!(!eval(Some(Value::from("cold_call")), cond.clone()));
        assert!(!eval(None, cond));

        // non-list expected: in is false
        let bad = Condition::new(ConditionOperator::In, Value::from("web"));
        assert!(!eval(Some(Value::from("web")), bad));
    }

    #[test]
    fn test_not_in_membership() {
        let cond = Condition::new(
            ConditionOperator::NotIn,
            Value::Array(vec![Value::from("spam")]),
        );
        assert!(eval(Some(Value::from("web")), cond.clone()));
        assert!(!eval(Some(Value::from("spam")), cond.clone()));
        assert!(eval(None, cond));

        // non-list expected: not_in is true
        let bad = Condition::new(ConditionOperator::NotIn, Value::from("spam"));
        assert!(eval(Some(Value::from("spam")), bad));
    }

    #[test]
    fn test_greater_than_with_coercion() {
        let cond = Condition::new(ConditionOperator::GreaterThan, Value::Number(10000.0));
        assert!(eval(Some(Value::Number(15000.0)), cond.clone()));
        assert!(eval(Some(Value::from("15000")), cond.clone()));
        assert!(!eval(Some(Value::Number(500.0)), cond.clone()));
        // non-numeric input degrades to false, never errors
        assert!(!eval(Some(Value::from("lots")), cond.clone()));
        assert!(!eval(None, cond));
    }

    #[test]
    fn test_numeric_bounds() {
        let value = Some(Value::Number(10.0));
        assert!(eval(
            value.clone(),
            Condition::new(ConditionOperator::GreaterThanOrEqual, Value::Number(10.0))
        ));
        assert!(eval(
            value.clone(),
            Condition::new(ConditionOperator::LessThanOrEqual, Value::Number(10.0))
        ));
        assert!(!eval(
            value,
            Condition::new(ConditionOperator::LessThan, Value::Number(10.0))
        ));
    }

    #[test]
    fn test_is_empty() {
        let cond = Condition::bare(ConditionOperator::IsEmpty);
        assert!(eval(None, cond.clone()));
        assert!(eval(Some(Value::Null), cond.clone()));
        assert!(eval(Some(Value::from("")), cond.clone()));
        assert!(!eval(Some(Value::from("x")), cond.clone()));
        assert!(!eval(Some(Value::Number(0.0)), cond));
    }

    #[test]
    fn test_is_not_empty() {
        let cond = Condition::bare(ConditionOperator::IsNotEmpty);
        assert!(eval(Some(Value::from("x")), cond.clone()));
        assert!(!eval(None, cond.clone()));
        assert!(!eval(Some(Value::from("")), cond));
    }

    #[test]
    fn test_regex_match() {
        let cond = Condition::new(ConditionOperator::Regex, Value::from("^acme"));
        assert!(eval(Some(Value::from("Acme Corp")), cond.clone()));
        assert!(!eval(Some(Value::from("Big Acme")), cond.clone()));
        assert!(!eval(None, cond));
    }

    #[test]
    fn test_invalid_regex_degrades_to_false() {
        let metrics = RoutingMetrics::new();
        let evaluator = ConditionEvaluator::new(metrics.clone());
        let cond = Condition::new(ConditionOperator::Regex, Value::from("["));

        assert!(!evaluator.evaluate(Some(&Value::from("x")), &cond));
        assert_eq!(metrics.invalid_regex.get(), 1);
    }

    #[test]
    fn test_unknown_operator_degrades_to_false() {
        let metrics = RoutingMetrics::new();
        let evaluator = ConditionEvaluator::new(metrics.clone());
        let cond = Condition::new(ConditionOperator::Unknown, Value::from("x"));

        assert!(!evaluator.evaluate(Some(&Value::from("x")), &cond));
        assert_eq!(metrics.unknown_operator.get(), 1);
    }

    #[test]
    fn test_missing_expected_is_non_match() {
        let cond = Condition::bare(ConditionOperator::Equals);
        assert!(!eval(Some(Value::from("x")), cond));

        // the negated operators must not match on malformed input either
        assert!(!eval(
            Some(Value::from("x")),
            Condition::bare(ConditionOperator::NotContains)
        ));
        assert!(!eval(None, Condition::bare(ConditionOperator::NotIn)));
    }
}
