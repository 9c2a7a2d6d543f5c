//! Manual assignment, reassignment, and redistribution flows

use leadroute_core::Lead;
use leadroute_engine::{
    AuditEvent, CancelToken, InMemoryAuditSink, InMemoryHistoryStore, InMemoryLeadStore,
    InMemoryUserDirectory, InMemoryWorkloadTracker, LeadStore, ManualAssignmentService,
    RouterConfig, RoutingError, RoutingMetrics, User, WorkloadTracker,
};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    users: Arc<InMemoryUserDirectory>,
    leads: Arc<InMemoryLeadStore>,
    history: Arc<InMemoryHistoryStore>,
    workload: Arc<InMemoryWorkloadTracker>,
    audit: Arc<InMemoryAuditSink>,
    service: ManualAssignmentService,
}

fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserDirectory::new());
    let leads = Arc::new(InMemoryLeadStore::new());
    let history = Arc::new(InMemoryHistoryStore::new());
    let workload = Arc::new(InMemoryWorkloadTracker::new());
    let audit = Arc::new(InMemoryAuditSink::new());
    let service = ManualAssignmentService::new(
        users.clone(),
        leads.clone(),
        history.clone(),
        workload.clone(),
        audit.clone(),
        RoutingMetrics::default(),
        RouterConfig::default(),
    );
    Fixture {
        users,
        leads,
        history,
        workload,
        audit,
        service,
    }
}

#[tokio::test]
async fn manual_assign_writes_ownership_and_history() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("u1", "Ann", "sales")).await;
    fx.leads.put(Lead::new("l1", "acme")).await;

    fx.service.assign("l1", "u1", "manager", None).await.unwrap();

    let lead = fx.leads.get("l1").await.unwrap().unwrap();
    let ownership = lead.ownership.unwrap();
    assert_eq!(ownership.assigned_to, "u1");

    let entries = fx.history.entries_for("l1").await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].previous_assignee, None);
    assert_eq!(entries[0].new_assignee, "u1");
    assert_eq!(entries[0].actor.as_deref(), Some("manager"));
    assert_eq!(entries[0].reason, "Manual assignment");
}

#[tokio::test]
async fn reassign_records_the_previous_owner() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("u1", "Ann", "sales")).await;
    fx.users.add_user("acme", User::new("u2", "Ben", "sales")).await;
    fx.leads.put(Lead::new("l1", "acme")).await;

    fx.service.assign("l1", "u1", "manager", None).await.unwrap();
    fx.service.reassign("l1", "u2", "manager", None).await.unwrap();

    let entries = fx.history.entries_for("l1").await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].previous_assignee.as_deref(), Some("u1"));
    assert_eq!(entries[1].new_assignee, "u2");
    assert_eq!(entries[1].reason, "Manual reassignment");

    // workload moved with the lead
    let counts = fx
        .workload
        .open_counts("acme", &["u1".to_string(), "u2".to_string()])
        .await
        .unwrap();
    assert_eq!(counts.get("u1"), Some(&0));
    assert_eq!(counts.get("u2"), Some(&1));
}

#[tokio::test]
async fn unknown_assignee_is_rejected_before_any_write() {
    let fx = fixture();
    fx.leads.put(Lead::new("l1", "acme")).await;

    let err = fx.service.assign("l1", "ghost", "manager", None).await.unwrap_err();
    assert!(matches!(err, RoutingError::AssigneeNotFound(_)));

    let lead = fx.leads.get("l1").await.unwrap().unwrap();
    assert!(lead.ownership.is_none());
    assert!(fx.history.entries().await.is_empty());
}

#[tokio::test]
async fn cross_tenant_assignee_is_rejected() {
    let fx = fixture();
    fx.users.add_user("other", User::new("u1", "Ann", "sales")).await;
    fx.leads.put(Lead::new("l1", "acme")).await;

    let err = fx.service.assign("l1", "u1", "manager", None).await.unwrap_err();
    assert!(matches!(err, RoutingError::AssigneeNotFound(_)));
}

#[tokio::test]
async fn custom_reason_overrides_the_default() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("u1", "Ann", "sales")).await;
    fx.leads.put(Lead::new("l1", "acme")).await;

    fx.service
        .assign("l1", "u1", "manager", Some("Territory handover"))
        .await
        .unwrap();

    let entries = fx.history.entries_for("l1").await;
    assert_eq!(entries[0].reason, "Territory handover");
}

#[tokio::test]
async fn assign_emits_an_audit_event() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("u1", "Ann", "sales")).await;
    fx.leads.put(Lead::new("l1", "acme")).await;

    fx.service.assign("l1", "u1", "manager", None).await.unwrap();
    // audit delivery is fire-and-forget; give the task a beat
    tokio::time::sleep(Duration::from_millis(20)).await;

    let events = fx.audit.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        AuditEvent::LeadAssigned {
            lead_id: "l1".to_string(),
            assignee: "u1".to_string(),
            actor: Some("manager".to_string()),
        }
    );
}

#[tokio::test]
async fn bulk_assign_isolates_missing_leads() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("u1", "Ann", "sales")).await;
    fx.leads.put(Lead::new("l1", "acme")).await;
    fx.leads.put(Lead::new("l3", "acme")).await;

    let ids = vec!["l1".to_string(), "l2".to_string(), "l3".to_string()];
    let summary = fx
        .service
        .bulk_assign(&ids, "u1", "manager", None, &CancelToken::new())
        .await;

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(summary.results[1].result.is_err());
    assert_eq!(fx.history.entries().await.len(), 2);
}

#[tokio::test]
async fn redistribute_targets_the_least_loaded_user() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("u1", "Ann", "sales")).await;
    fx.users.add_user("acme", User::new("u2", "Ben", "sales")).await;
    fx.workload.set_count("acme", "u1", 5).await;
    fx.workload.set_count("acme", "u2", 1).await;
    for i in 0..3 {
        fx.leads.put(Lead::new(format!("l{i}"), "acme")).await;
    }

    let summary = fx.service.redistribute("acme", "manager", &CancelToken::new()).await.unwrap();
    assert_eq!(summary.target_user, "u2");
    assert_eq!(summary.moved, 3);

    for i in 0..3 {
        let lead = fx.leads.get(&format!("l{i}")).await.unwrap().unwrap();
        assert_eq!(lead.ownership.unwrap().assigned_to, "u2");
    }
    for entry in fx.history.entries().await {
        assert_eq!(entry.reason, "Workload redistribution");
    }
}

#[tokio::test]
async fn redistribute_is_bounded_by_the_batch_size() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("u1", "Ann", "sales")).await;
    for i in 0..15 {
        fx.leads.put(Lead::new(format!("l{i:02}"), "acme")).await;
    }

    let summary = fx.service.redistribute("acme", "manager", &CancelToken::new()).await.unwrap();
    assert_eq!(summary.moved, 10);

    let remaining = fx.leads.list_unassigned("acme", 100).await.unwrap();
    assert_eq!(remaining.len(), 5);
}

#[tokio::test]
async fn redistribute_skips_assigned_leads() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("u1", "Ann", "sales")).await;
    fx.users.add_user("acme", User::new("u2", "Ben", "sales")).await;
    fx.leads.put(Lead::new("l1", "acme")).await;
    fx.leads.put(Lead::new("l2", "acme")).await;
    fx.service.assign("l1", "u1", "manager", None).await.unwrap();

    let summary = fx.service.redistribute("acme", "manager", &CancelToken::new()).await.unwrap();
    assert_eq!(summary.moved, 1);
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].lead_id, "l2");

    // the assigned lead kept its owner
    let lead = fx.leads.get("l1").await.unwrap().unwrap();
    assert_eq!(lead.ownership.unwrap().assigned_to, "u1");
}

#[tokio::test]
async fn redistribute_honors_cancellation() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("u1", "Ann", "sales")).await;
    fx.leads.put(Lead::new("l1", "acme")).await;
    fx.leads.put(Lead::new("l2", "acme")).await;

    let token = CancelToken::new();
    token.cancel();
    let summary = fx.service.redistribute("acme", "manager", &token).await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.moved, 0);
    assert!(summary.results.is_empty());
    // no lead was touched
    for id in ["l1", "l2"] {
        let lead = fx.leads.get(id).await.unwrap().unwrap();
        assert!(lead.ownership.is_none());
    }
}

#[tokio::test]
async fn redistribute_without_eligible_users_fails() {
    let fx = fixture();
    fx.users.add_user("acme", User::new("boss", "Boss", "admin")).await;
    fx.leads.put(Lead::new("l1", "acme")).await;

    let err = fx.service.redistribute("acme", "manager", &CancelToken::new()).await.unwrap_err();
    assert!(matches!(err, RoutingError::NoEligibleUser));
}