//! Assignment history records
//!
//! One entry is appended per successful ownership change, auto or manual.
//! Entries are never mutated after creation; reading them back belongs to
//! reporting collaborators, not this engine.

use crate::{LeadId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only record of one ownership change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentHistoryEntry {
    /// Entry identifier
    pub id: String,
    /// Lead whose ownership changed
    pub lead_id: LeadId,
    /// Owner before the change, `None` when the lead was unassigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_assignee: Option<UserId>,
    /// Owner after the change
    pub new_assignee: UserId,
    /// Who triggered the change, `None` for system-triggered routing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<UserId>,
    /// Free-text reason
    pub reason: String,
    /// When the change happened
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_entry_serde() {
        let entry = AssignmentHistoryEntry {
            id: "h1".to_string(),
            lead_id: "l1".to_string(),
            previous_assignee: None,
            new_assignee: "u1".to_string(),
            actor: Some("admin".to_string()),
            reason: "Manual assignment".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("previous_assignee"));
        let back: AssignmentHistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
