//! Rule CRUD service and the tenant-scoped rule cache
//!
//! Rules are read-mostly: routing reads them on every call while CRUD is
//! rare, so active rules are cached per tenant and invalidated on every
//! write. Conditions are validated before persistence; validation never
//! runs on the matching hot path.

use crate::error::{Result, RoutingError};
use crate::metrics::RoutingMetrics;
use crate::store::{AuditEvent, AuditSink, RuleStore};
use leadroute_core::{validate_conditions, AssignmentRule, TenantId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fire-and-forget audit notification: failures are counted and logged,
/// never propagated to the caller
pub(crate) fn notify_audit(audit: Arc<dyn AuditSink>, metrics: RoutingMetrics, event: AuditEvent) {
    tokio::spawn(async move {
        if let Err(err) = audit.record(event).await {
            metrics.audit_failures.inc();
            tracing::warn!(error = %err, "Audit notification failed");
        }
    });
}

/// Per-tenant cache of active rules
#[derive(Default)]
pub struct RuleCache {
    entries: RwLock<HashMap<TenantId, Arc<Vec<AssignmentRule>>>>,
}

impl RuleCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Active rules for a tenant, loading through the store on a miss
    pub async fn active_rules(
        &self,
        tenant: &str,
        store: &dyn RuleStore,
    ) -> Result<Arc<Vec<AssignmentRule>>> {
        {
            let entries = self.entries.read().await;
            if let Some(rules) = entries.get(tenant) {
                return Ok(rules.clone());
            }
        }

        let loaded = Arc::new(store.list_active(tenant).await?);
        let mut entries = self.entries.write().await;
        // a concurrent loader may have beaten us; last write wins, both
        // hold the same store contents
        entries.insert(tenant.to_string(), loaded.clone());
        Ok(loaded)
    }

    /// Drop a tenant's cached rules
    pub async fn invalidate(&self, tenant: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(tenant);
    }
}

/// Authoring surface for assignment rules
pub struct RuleService {
    store: Arc<dyn RuleStore>,
    cache: Arc<RuleCache>,
    audit: Arc<dyn AuditSink>,
    metrics: RoutingMetrics,
}

impl RuleService {
    /// Create a rule service
    pub fn new(
        store: Arc<dyn RuleStore>,
        cache: Arc<RuleCache>,
        audit: Arc<dyn AuditSink>,
        metrics: RoutingMetrics,
    ) -> Self {
        Self {
            store,
            cache,
            audit,
            metrics,
        }
    }

    /// Validate and persist a new rule
    pub async fn create_rule(&self, rule: AssignmentRule, actor: Option<&str>) -> Result<()> {
        validate_conditions(&rule.conditions).into_result()?;

        let rule_id = rule.id.clone();
        let tenant = rule.tenant_id.clone();
        self.store.insert(rule).await?;
        self.cache.invalidate(&tenant).await;

        notify_audit(
            self.audit.clone(),
            self.metrics.clone(),
            AuditEvent::RuleCreated {
                rule_id,
                actor: actor.map(str::to_string),
            },
        );
        Ok(())
    }

    /// Validate and replace an existing rule
    pub async fn update_rule(&self, rule: AssignmentRule, actor: Option<&str>) -> Result<()> {
        validate_conditions(&rule.conditions).into_result()?;

        let rule_id = rule.id.clone();
        let tenant = rule.tenant_id.clone();
        self.store.update(rule).await?;
        self.cache.invalidate(&tenant).await;

        notify_audit(
            self.audit.clone(),
            self.metrics.clone(),
            AuditEvent::RuleUpdated {
                rule_id,
                actor: actor.map(str::to_string),
            },
        );
        Ok(())
    }

    /// Delete a rule
    pub async fn delete_rule(&self, rule_id: &str, tenant: &str, actor: Option<&str>) -> Result<()> {
        if !self.store.delete(rule_id, tenant).await? {
            return Err(RoutingError::RuleNotFound(rule_id.to_string()));
        }
        self.cache.invalidate(tenant).await;

        notify_audit(
            self.audit.clone(),
            self.metrics.clone(),
            AuditEvent::RuleDeleted {
                rule_id: rule_id.to_string(),
                actor: actor.map(str::to_string),
            },
        );
        Ok(())
    }

    /// Fetch one rule
    pub async fn get_rule(&self, rule_id: &str, tenant: &str) -> Result<AssignmentRule> {
        self.store
            .get(rule_id, tenant)
            .await?
            .ok_or_else(|| RoutingError::RuleNotFound(rule_id.to_string()))
    }

    /// Active rules for a tenant, via the cache
    pub async fn active_rules(&self, tenant: &str) -> Result<Arc<Vec<AssignmentRule>>> {
        self.cache.active_rules(tenant, self.store.as_ref()).await
    }
}
