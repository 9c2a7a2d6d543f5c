//! In-memory store implementations for testing and embedding

use super::{AuditEvent, AuditSink, HistoryStore, LeadStore, RuleStore, SourceCounts, User, UserDirectory};
use crate::error::{Result, RoutingError};
use async_trait::async_trait;
use leadroute_core::{
    AssignmentHistoryEntry, AssignmentRule, AssignmentSource, Lead, LeadId, Ownership, RuleId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory rule store
#[derive(Default)]
pub struct InMemoryRuleStore {
    rules: RwLock<HashMap<RuleId, AssignmentRule>>,
}

impl InMemoryRuleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with rules
    pub fn with_rules(rules: Vec<AssignmentRule>) -> Self {
        let map = rules.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            rules: RwLock::new(map),
        }
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn list_active(&self, tenant: &str) -> Result<Vec<AssignmentRule>> {
        let rules = self.rules.read().await;
        Ok(rules
            .values()
            .filter(|r| r.tenant_id == tenant && r.is_active)
            .cloned()
            .collect())
    }

    async fn get(&self, rule_id: &str, tenant: &str) -> Result<Option<AssignmentRule>> {
        let rules = self.rules.read().await;
        Ok(rules
            .get(rule_id)
            .filter(|r| r.tenant_id == tenant)
            .cloned())
    }

    async fn insert(&self, rule: AssignmentRule) -> Result<()> {
        let mut rules = self.rules.write().await;
        rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    async fn update(&self, rule: AssignmentRule) -> Result<()> {
        let mut rules = self.rules.write().await;
        if !rules.contains_key(&rule.id) {
            return Err(RoutingError::RuleNotFound(rule.id));
        }
        rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    async fn delete(&self, rule_id: &str, tenant: &str) -> Result<bool> {
        let mut rules = self.rules.write().await;
        let existed = rules
            .get(rule_id)
            .map_or(false, |r| r.tenant_id == tenant);
        if existed {
            rules.remove(rule_id);
        }
        Ok(existed)
    }
}

/// In-memory user directory
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, Vec<User>>>,
}

impl InMemoryUserDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user to a tenant
    pub async fn add_user(&self, tenant: &str, user: User) {
        let mut users = self.users.write().await;
        users.entry(tenant.to_string()).or_default().push(user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn list_eligible(&self, tenant: &str, excluded_roles: &[String]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users
            .get(tenant)
            .map(|tenant_users| {
                tenant_users
                    .iter()
                    .filter(|u| u.is_active && !excluded_roles.contains(&u.role))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn exists(&self, user_id: &str, tenant: &str) -> Result<bool> {
        let users = self.users.read().await;
        Ok(users
            .get(tenant)
            .map_or(false, |tenant_users| {
                tenant_users.iter().any(|u| u.id == user_id && u.is_active)
            }))
    }
}

/// In-memory lead store with compare-and-swap claim semantics
#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<LeadId, Lead>>,
}

impl InMemoryLeadStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a lead
    pub async fn put(&self, lead: Lead) {
        let mut leads = self.leads.write().await;
        leads.insert(lead.id.clone(), lead);
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn get(&self, lead_id: &str) -> Result<Option<Lead>> {
        let leads = self.leads.read().await;
        Ok(leads.get(lead_id).cloned())
    }

    async fn set_ownership(&self, lead_id: &str, ownership: Option<Ownership>) -> Result<()> {
        let mut leads = self.leads.write().await;
        let lead = leads
            .get_mut(lead_id)
            .ok_or_else(|| RoutingError::LeadNotFound(lead_id.to_string()))?;
        lead.ownership = ownership;
        Ok(())
    }

    async fn claim(
        &self,
        lead_id: &str,
        expected_owner: Option<&str>,
        ownership: Ownership,
    ) -> Result<bool> {
        // The whole check-then-set runs under one write lock, which is
        // what makes the claim atomic with respect to other claims.
        let mut leads = self.leads.write().await;
        let lead = leads
            .get_mut(lead_id)
            .ok_or_else(|| RoutingError::LeadNotFound(lead_id.to_string()))?;

        let current = lead.ownership.as_ref().map(|o| o.assigned_to.as_str());
        if current != expected_owner {
            return Ok(false);
        }
        lead.ownership = Some(ownership);
        Ok(true)
    }

    async fn list_unassigned(&self, tenant: &str, limit: usize) -> Result<Vec<LeadId>> {
        let leads = self.leads.read().await;
        let mut ids: Vec<LeadId> = leads
            .values()
            .filter(|l| l.tenant_id == tenant && l.ownership.is_none())
            .map(|l| l.id.clone())
            .collect();
        ids.sort();
        ids.truncate(limit);
        Ok(ids)
    }

    async fn source_counts(&self, tenant: &str) -> Result<SourceCounts> {
        let leads = self.leads.read().await;
        let mut counts = SourceCounts::default();
        for lead in leads.values().filter(|l| l.tenant_id == tenant) {
            counts.total += 1;
            match lead.ownership.as_ref().map(|o| o.source) {
                None => counts.unassigned += 1,
                Some(source) => {
                    counts.assigned += 1;
                    match source {
                        AssignmentSource::Manual => counts.manual += 1,
                        AssignmentSource::Rule => counts.rule += 1,
                        AssignmentSource::Auto => counts.auto += 1,
                    }
                }
            }
        }
        Ok(counts)
    }

    async fn rule_usage_counts(&self, tenant: &str) -> Result<HashMap<RuleId, u64>> {
        let leads = self.leads.read().await;
        let mut usage: HashMap<RuleId, u64> = HashMap::new();
        for lead in leads.values().filter(|l| l.tenant_id == tenant) {
            if let Some(rule_id) = lead.ownership.as_ref().and_then(|o| o.rule_id.clone()) {
                *usage.entry(rule_id).or_default() += 1;
            }
        }
        Ok(usage)
    }
}

/// In-memory append-only history store
///
/// Can be switched into a failing mode so tests can exercise the commit
/// rollback path.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: RwLock<Vec<AssignmentHistoryEntry>>,
    failing: AtomicBool,
}

impl InMemoryHistoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail (or stop failing)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of all appended entries
    pub async fn entries(&self) -> Vec<AssignmentHistoryEntry> {
        self.entries.read().await.clone()
    }

    /// Entries for one lead, oldest first
    pub async fn entries_for(&self, lead_id: &str) -> Vec<AssignmentHistoryEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.lead_id == lead_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, entry: AssignmentHistoryEntry) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RoutingError::Persistence(
                "history store unavailable".to_string(),
            ));
        }
        self.entries.write().await.push(entry);
        Ok(())
    }
}

/// In-memory audit sink that records every event
#[derive(Default)]
pub struct InMemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
