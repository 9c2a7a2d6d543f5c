//! Routing orchestration: the automatic assignment entry point
//!
//! `LeadRouter` ties the pieces together: load active rules (cached),
//! match, execute the winning rule's strategy (or the synthetic fallback
//! when nothing matches), then commit ownership and history as one unit.
//! Auto-assignment never overwrites an existing owner.

use crate::cancel::CancelToken;
use crate::commit::{ClaimMode, CommitOutcome, CommitRequest, OwnershipWriter};
use crate::config::RouterConfig;
use crate::error::{Result, RoutingError};
use crate::evaluator::ConditionEvaluator;
use crate::executor::AssignmentExecutor;
use crate::matcher::RuleMatcher;
use crate::metrics::RoutingMetrics;
use crate::result::{AssignmentOutcome, BulkItem, BulkSummary, Recommendation, RoutingStats, RuleUsage};
use crate::rules::RuleCache;
use crate::store::{HistoryStore, LeadStore, RuleStore, User, UserDirectory};
use crate::workload::{InMemoryWorkloadTracker, WorkloadBalancer, WorkloadTracker};
use leadroute_core::{AssignmentRule, AssignmentStrategy, Lead};
use std::sync::Arc;

/// Top-level routing engine
pub struct LeadRouter {
    rules: Arc<dyn RuleStore>,
    users: Arc<dyn UserDirectory>,
    leads: Arc<dyn LeadStore>,
    cache: Arc<RuleCache>,
    matcher: RuleMatcher,
    executor: AssignmentExecutor,
    balancer: Arc<WorkloadBalancer>,
    writer: OwnershipWriter,
    metrics: RoutingMetrics,
    config: RouterConfig,
}

/// Builder for [`LeadRouter`]
pub struct LeadRouterBuilder {
    rules: Arc<dyn RuleStore>,
    users: Arc<dyn UserDirectory>,
    leads: Arc<dyn LeadStore>,
    history: Arc<dyn HistoryStore>,
    workload: Option<Arc<dyn WorkloadTracker>>,
    cache: Option<Arc<RuleCache>>,
    metrics: Option<RoutingMetrics>,
    config: RouterConfig,
}

impl LeadRouterBuilder {
    /// Use a specific workload tracker; defaults to the in-memory one
    pub fn with_workload_tracker(mut self, tracker: Arc<dyn WorkloadTracker>) -> Self {
        self.workload = Some(tracker);
        self
    }

    /// Share a rule cache with a [`crate::rules::RuleService`]
    pub fn with_rule_cache(mut self, cache: Arc<RuleCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Report into shared metrics
    pub fn with_metrics(mut self, metrics: RoutingMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Override the default configuration
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Assemble the router
    pub fn build(self) -> LeadRouter {
        let metrics = self.metrics.unwrap_or_default();
        let workload = self
            .workload
            .unwrap_or_else(|| Arc::new(InMemoryWorkloadTracker::new()));
        let balancer = Arc::new(WorkloadBalancer::new(
            workload.clone(),
            metrics.clone(),
            self.config.balancer_max_retries,
            self.config.balancer_backoff,
        ));
        let evaluator = ConditionEvaluator::new(metrics.clone());

        LeadRouter {
            rules: self.rules,
            users: self.users,
            leads: self.leads.clone(),
            cache: self.cache.unwrap_or_else(|| Arc::new(RuleCache::new())),
            matcher: RuleMatcher::new(evaluator),
            executor: AssignmentExecutor::new(balancer.clone()),
            balancer,
            writer: OwnershipWriter::new(self.leads, self.history, workload),
            metrics,
            config: self.config,
        }
    }
}

impl LeadRouter {
    /// Start building a router from its four required collaborators
    pub fn builder(
        rules: Arc<dyn RuleStore>,
        users: Arc<dyn UserDirectory>,
        leads: Arc<dyn LeadStore>,
        history: Arc<dyn HistoryStore>,
    ) -> LeadRouterBuilder {
        LeadRouterBuilder {
            rules,
            users,
            leads,
            history,
            workload: None,
            cache: None,
            metrics: None,
            config: RouterConfig::default(),
        }
    }

    /// The metrics this router reports into
    pub fn metrics(&self) -> &RoutingMetrics {
        &self.metrics
    }

    /// Route one lead. Re-entry on an already-assigned lead is an
    /// idempotent no-op.
    pub async fn auto_assign(
        &self,
        lead_id: &str,
        actor: Option<&str>,
    ) -> Result<AssignmentOutcome> {
        let lead = self.fetch_lead(lead_id).await?;

        if let Some(owner) = lead.assigned_to() {
            tracing::debug!(lead_id, owner = %owner, "Lead already assigned, skipping");
            return Ok(AssignmentOutcome::AlreadyAssigned {
                assignee: owner.clone(),
            });
        }

        let rules = self.cache.active_rules(&lead.tenant_id, self.rules.as_ref()).await?;
        let pool = self.eligible_pool(&lead.tenant_id).await?;

        let fallback = AssignmentRule::fallback(&lead.tenant_id);
        let rule = self.matcher.best_match(&lead, &rules).unwrap_or(&fallback);

        let placement = self.executor.place(rule, &lead, &pool).await?;
        let reason = if rule.is_fallback() {
            "Round-robin assignment".to_string()
        } else {
            format!("Auto-assigned by rule: {}", rule.name)
        };

        let outcome = self
            .writer
            .commit(CommitRequest {
                lead: &lead,
                decision: &placement.decision,
                actor,
                reason,
                mode: ClaimMode::UnassignedOnly,
                reserved: placement.reserved,
            })
            .await?;

        match outcome {
            CommitOutcome::Committed => {
                tracing::info!(
                    lead_id,
                    assignee = %placement.decision.assignee,
                    source = placement.decision.source.as_str(),
                    rule_id = placement.decision.matched_rule_id.as_deref().unwrap_or("-"),
                    "Lead assigned"
                );
                Ok(AssignmentOutcome::Assigned(placement.decision))
            }
            CommitOutcome::LostClaim => {
                // a concurrent call won; report their owner as the no-op
                // result, same as arriving after them
                let current = self.fetch_lead(lead_id).await?;
                match current.assigned_to() {
                    Some(owner) => Ok(AssignmentOutcome::AlreadyAssigned {
                        assignee: owner.clone(),
                    }),
                    None => Err(RoutingError::ConcurrencyConflict(lead_id.to_string())),
                }
            }
        }
    }

    /// Route many leads independently; one lead's failure never aborts
    /// the batch. The token stops the loop between leads.
    pub async fn bulk_auto_assign(
        &self,
        lead_ids: &[String],
        actor: Option<&str>,
        cancel: &CancelToken,
    ) -> BulkSummary<AssignmentOutcome> {
        let mut results = Vec::with_capacity(lead_ids.len());
        let mut cancelled = false;

        for lead_id in lead_ids {
            if cancel.is_cancelled() {
                cancelled = true;
                tracing::info!(
                    remaining = lead_ids.len() - results.len(),
                    "Bulk auto-assignment cancelled"
                );
                break;
            }
            let result = self
                .auto_assign(lead_id, actor)
                .await
                .map_err(|e| e.to_string());
            results.push(BulkItem {
                lead_id: lead_id.clone(),
                result,
            });
        }

        BulkSummary::from_results(results, cancelled)
    }

    /// All active rules that match a lead, each with the user the rule
    /// would pick right now, ranked by confidence
    pub async fn recommendations(&self, lead_id: &str) -> Result<Vec<Recommendation>> {
        let lead = self.fetch_lead(lead_id).await?;
        let rules = self.cache.active_rules(&lead.tenant_id, self.rules.as_ref()).await?;
        let pool = self.eligible_pool(&lead.tenant_id).await?;

        let mut recommendations = Vec::new();
        for rule in rules.iter() {
            if !self.matcher.matches(&lead, rule) {
                continue;
            }
            let candidate = match &rule.strategy {
                AssignmentStrategy::SpecificUser { assigned_to } => Some(assigned_to.clone()),
                AssignmentStrategy::RoundRobin | AssignmentStrategy::Team => self
                    .balancer
                    .peek_least_loaded(&lead.tenant_id, &pool)
                    .await
                    .ok(),
            };
            let Some(candidate) = candidate else {
                continue;
            };
            recommendations.push(Recommendation {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                candidate,
                confidence: f64::from(rule.priority) / 10.0,
            });
        }

        recommendations.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        Ok(recommendations)
    }

    /// Aggregate assignment counts and per-rule usage for a tenant
    pub async fn routing_stats(&self, tenant: &str) -> Result<RoutingStats> {
        let counts = self.leads.source_counts(tenant).await?;
        let usage_by_rule = self.leads.rule_usage_counts(tenant).await?;
        let rules = self.cache.active_rules(tenant, self.rules.as_ref()).await?;

        let mut rule_usage: Vec<RuleUsage> = rules
            .iter()
            .map(|rule| RuleUsage {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                count: usage_by_rule.get(&rule.id).copied().unwrap_or(0),
            })
            .collect();
        rule_usage.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.rule_id.cmp(&b.rule_id)));

        Ok(RoutingStats { counts, rule_usage })
    }

    async fn fetch_lead(&self, lead_id: &str) -> Result<Lead> {
        self.leads
            .get(lead_id)
            .await?
            .ok_or_else(|| RoutingError::LeadNotFound(lead_id.to_string()))
    }

    async fn eligible_pool(&self, tenant: &str) -> Result<Vec<User>> {
        self.users
            .list_eligible(tenant, &self.config.excluded_roles)
            .await
    }
}
