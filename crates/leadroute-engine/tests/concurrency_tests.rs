//! Races over the same stores: duplicate suppression and workload
//! convergence under concurrent auto-assignment

use leadroute_core::Lead;
use leadroute_engine::{
    AssignmentOutcome, InMemoryHistoryStore, InMemoryLeadStore, InMemoryRuleStore,
    InMemoryUserDirectory, LeadRouter, LeadStore, RouterConfig, User,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn contended_config() -> RouterConfig {
    // plenty of retries and a short backoff so the balancer always
    // resolves contention instead of degrading mid-test
    RouterConfig {
        balancer_max_retries: 100,
        balancer_backoff: Duration::from_millis(1),
        ..RouterConfig::default()
    }
}

async fn build_router(
    users: &[&str],
    leads: &[String],
) -> (Arc<LeadRouter>, Arc<InMemoryLeadStore>, Arc<InMemoryHistoryStore>) {
    let rules = Arc::new(InMemoryRuleStore::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    for id in users {
        directory.add_user("acme", User::new(*id, *id, "sales")).await;
    }
    let lead_store = Arc::new(InMemoryLeadStore::new());
    for id in leads {
        lead_store.put(Lead::new(id.clone(), "acme")).await;
    }
    let history = Arc::new(InMemoryHistoryStore::new());
    let router = Arc::new(
        LeadRouter::builder(rules, directory, lead_store.clone(), history.clone())
            .with_config(contended_config())
            .build(),
    );
    (router, lead_store, history)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_assignment_converges_to_even_workload() {
    let lead_ids: Vec<String> = (0..50).map(|i| format!("l{i}")).collect();
    let (router, lead_store, history) =
        build_router(&["u1", "u2", "u3", "u4", "u5"], &lead_ids).await;

    let mut handles = Vec::new();
    for id in &lead_ids {
        let router = router.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move { router.auto_assign(&id, None).await }));
    }
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, AssignmentOutcome::Assigned(_)));
    }

    let mut per_user: HashMap<String, usize> = HashMap::new();
    for id in &lead_ids {
        let lead = lead_store.get(id).await.unwrap().unwrap();
        let owner = lead.assigned_to().cloned().unwrap();
        *per_user.entry(owner).or_default() += 1;
    }

    assert_eq!(per_user.len(), 5);
    for (user, count) in &per_user {
        assert_eq!(*count, 10, "uneven workload for {user}: {per_user:?}");
    }
    assert_eq!(history.entries().await.len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_callers_on_one_lead_assign_exactly_once() {
    let lead_ids = vec!["l1".to_string()];
    let (router, lead_store, history) = build_router(&["u1", "u2"], &lead_ids).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let router = router.clone();
        handles.push(tokio::spawn(async move { router.auto_assign("l1", None).await }));
    }

    let mut fresh = 0;
    let mut repeats = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            AssignmentOutcome::Assigned(_) => fresh += 1,
            AssignmentOutcome::AlreadyAssigned { .. } => repeats += 1,
        }
    }

    assert_eq!(fresh, 1, "exactly one caller may win the claim");
    assert_eq!(repeats, 7);
    assert_eq!(history.entries_for("l1").await.len(), 1);

    let lead = lead_store.get("l1").await.unwrap().unwrap();
    assert!(lead.ownership.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn losers_report_the_winning_owner() {
    let lead_ids = vec!["l1".to_string()];
    let (router, lead_store, _) = build_router(&["u1", "u2", "u3"], &lead_ids).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let router = router.clone();
        handles.push(tokio::spawn(async move { router.auto_assign("l1", None).await }));
    }

    let mut assignees = Vec::new();
    for handle in handles {
        assignees.push(handle.await.unwrap().unwrap().assignee().clone());
    }
    let winner = lead_store
        .get("l1")
        .await
        .unwrap()
        .unwrap()
        .assigned_to()
        .cloned()
        .unwrap();
    assert!(assignees.iter().all(|a| *a == winner));
}
