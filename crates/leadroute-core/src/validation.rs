//! Authoring-time validation of rule conditions
//!
//! Validation runs before a rule is persisted and never on the matching
//! hot path. Matching itself degrades safely on bad configuration; this
//! module exists so most bad configuration is rejected at the door.

use crate::condition::{Condition, ConditionOperator};
use std::collections::BTreeMap;
use thiserror::Error;

/// Type of a lead field, used to check operator compatibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
}

/// A lead field conditions may reference
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name as it appears on leads
    pub name: &'static str,
    /// Display label
    pub label: &'static str,
    /// Field type
    pub field_type: FieldType,
}

/// Fields available for rule conditions
pub fn lead_fields() -> &'static [FieldDef] {
    const FIELDS: &[FieldDef] = &[
        FieldDef { name: "source", label: "Lead Source", field_type: FieldType::String },
        FieldDef { name: "status", label: "Lead Status", field_type: FieldType::String },
        FieldDef { name: "company", label: "Company", field_type: FieldType::String },
        FieldDef { name: "industry", label: "Industry", field_type: FieldType::String },
        FieldDef { name: "location", label: "Location", field_type: FieldType::String },
        FieldDef { name: "lead_score", label: "Lead Score", field_type: FieldType::Number },
        FieldDef { name: "deal_value", label: "Deal Value", field_type: FieldType::Number },
        FieldDef { name: "pipeline_stage_id", label: "Pipeline Stage", field_type: FieldType::String },
        FieldDef { name: "created_at", label: "Created Date", field_type: FieldType::Date },
        FieldDef { name: "last_contact_date", label: "Last Contact Date", field_type: FieldType::Date },
    ];
    FIELDS
}

/// Field types an operator can be applied to
pub fn operator_field_types(operator: ConditionOperator) -> &'static [FieldType] {
    use ConditionOperator::*;
    match operator {
        Equals | NotEquals => &[FieldType::String, FieldType::Number, FieldType::Boolean],
        Contains | NotContains | StartsWith | EndsWith | IsEmpty | IsNotEmpty | Regex => {
            &[FieldType::String]
        }
        In | NotIn => &[FieldType::String, FieldType::Number],
        GreaterThan | LessThan | GreaterThanOrEqual | LessThanOrEqual => {
            &[FieldType::Number, FieldType::Date]
        }
        Unknown => &[],
    }
}

/// Conditions failed validation
#[derive(Debug, Clone, Error)]
#[error("invalid conditions: {}", errors.join("; "))]
pub struct InvalidConditions {
    /// One message per problem found
    pub errors: Vec<String>,
}

/// Result of validating a rule's condition map
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// One message per problem found; empty means valid
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Whether the conditions passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert to a `Result`, erring when any problem was found
    pub fn into_result(self) -> Result<(), InvalidConditions> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(InvalidConditions { errors: self.errors })
        }
    }
}

/// Validate a rule's condition map against the field catalog and the
/// operator capability table
pub fn validate_conditions(conditions: &BTreeMap<String, Condition>) -> ValidationReport {
    let mut errors = Vec::new();

    for (field, condition) in conditions {
        let Some(field_def) = lead_fields().iter().find(|f| f.name == field) else {
            errors.push(format!("Unknown field: {}", field));
            continue;
        };

        if condition.operator == ConditionOperator::Unknown {
            errors.push(format!("Unknown operator for field {}", field));
            continue;
        }

        if !operator_field_types(condition.operator).contains(&field_def.field_type) {
            errors.push(format!(
                "Operator {} is not compatible with field {}",
                condition.operator.as_str(),
                field
            ));
            continue;
        }

        if condition.expected.is_none() && !condition.operator.is_emptiness() {
            errors.push(format!("Missing expected value for field {}", field));
        }
    }

    ValidationReport { errors }
}
