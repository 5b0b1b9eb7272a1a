mod common;

use std::time::{Duration, Instant};

use common::*;
use draftloom::client::ApiClient;
use draftloom::model::Position;
use draftloom::poll::{PollOutcome, PollReconciler};
use draftloom::save::{SaveState, SaveStatus};
use httpmock::prelude::*;
use serde_json::json;

fn idle_status() -> SaveStatus {
    SaveStatus::default()
}

fn saving_status() -> SaveStatus {
    SaveStatus {
        state: SaveState::Saving,
        message: None,
    }
}

#[tokio::test]
async fn identical_lists_are_no_change() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/wf-1/versions");
            then.status(200)
                .json_body(json!([version("v1", 1, true), version("v2", 2, false)]));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let mut session = open_session();
    session
        .registry
        .adopt(vec![version("v1", 1, true), version("v2", 2, false)]);

    let mut reconciler = PollReconciler::new(&test_config());
    let outcome = reconciler
        .poll_once(&mut session, &client, Instant::now())
        .await
        .unwrap();
    assert_eq!(outcome, PollOutcome::NoChange);
}

#[tokio::test]
async fn divergent_metadata_triggers_a_refresh() {
    let server = MockServer::start_async().await;
    let mut newer = version("v2", 2, false);
    newer.updated_at = newer.updated_at + chrono::TimeDelta::seconds(60);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/wf-1/versions");
            then.status(200)
                .json_body(json!([version("v1", 1, true), newer]));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let mut session = open_session();
    session
        .registry
        .adopt(vec![version("v1", 1, true), version("v2", 2, false)]);

    let mut reconciler = PollReconciler::new(&test_config());
    let outcome = reconciler
        .poll_once(&mut session, &client, Instant::now())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Refreshed {
            active_version_changed: false
        }
    );
    // The refreshed metadata is now local.
    let v2 = session.registry.version("v2").unwrap();
    assert_eq!(
        v2.updated_at,
        version("v2", 2, false).updated_at + chrono::TimeDelta::seconds(60)
    );
}

#[tokio::test]
async fn promotion_elsewhere_flags_the_active_version_change() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/wf-1/versions");
            then.status(200)
                .json_body(json!([version("v1", 1, false), version("v2", 2, true)]));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let mut session = open_session();
    session
        .registry
        .adopt(vec![version("v1", 1, true), version("v2", 2, false)]);

    let mut reconciler = PollReconciler::new(&test_config());
    let outcome = reconciler
        .poll_once(&mut session, &client, Instant::now())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Refreshed {
            active_version_changed: true
        }
    );
}

#[tokio::test]
async fn disappeared_non_draft_version_counts_as_divergence() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/wf-1/versions");
            then.status(200).json_body(json!([version("v2", 2, true)]));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let mut session = open_session();
    session
        .registry
        .adopt(vec![version("v1", 1, false), version("v2", 2, true)]);

    let mut reconciler = PollReconciler::new(&test_config());
    let outcome = reconciler
        .poll_once(&mut session, &client, Instant::now())
        .await
        .unwrap();
    assert!(matches!(outcome, PollOutcome::Refreshed { .. }));
}

#[tokio::test]
async fn local_pending_changes_veto_the_refresh() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/wf-1/versions");
            then.status(200).json_body(json!([version("v1", 1, true)]));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let mut session = open_session();
    session
        .registry
        .adopt(vec![version("v1", 1, true), version("v2", 2, false)]);
    // An edit lands before the response is applied.
    session
        .move_node("agent-1", Position::new(900.0, 0.0))
        .unwrap();

    let mut reconciler = PollReconciler::new(&test_config());
    let outcome = reconciler
        .poll_once(&mut session, &client, Instant::now())
        .await
        .unwrap();
    assert_eq!(outcome, PollOutcome::Vetoed);
    // Local metadata untouched.
    assert!(session.registry.version("v2").is_some());
}

#[tokio::test]
async fn missing_workflow_escalates_to_a_list_reload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/wf-1/versions");
            then.status(404).json_body(json!({"detail": "not found"}));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let mut session = open_session();
    session.registry.adopt(vec![version("v1", 1, true)]);

    let mut reconciler = PollReconciler::new(&test_config());
    let outcome = reconciler
        .poll_once(&mut session, &client, Instant::now())
        .await
        .unwrap();
    assert_eq!(outcome, PollOutcome::WorkflowMissing);
}

#[test]
fn poll_gates_on_selection_idle_state_and_interval() {
    let config = test_config().with_poll_interval(Duration::from_secs(10));
    let reconciler = PollReconciler::new(&config);
    let now = Instant::now();

    // No workflow selected.
    let clean = draftloom::session::EditorSession::new(&config);
    assert!(!reconciler.should_poll(&clean, &idle_status(), now));

    let mut session = open_session();
    session.registry.adopt(vec![version("v1", 1, true)]);
    assert!(reconciler.should_poll(&session, &idle_status(), now));

    // A save in flight suppresses polling.
    assert!(!reconciler.should_poll(&session, &saving_status(), now));

    // Unsaved local work suppresses polling.
    session
        .move_node("agent-1", Position::new(900.0, 0.0))
        .unwrap();
    assert!(!reconciler.should_poll(&session, &idle_status(), now));
}

#[tokio::test]
async fn interval_throttles_consecutive_polls() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/wf-1/versions");
            then.status(200).json_body(json!([version("v1", 1, true)]));
        })
        .await;

    let config = test_config().with_poll_interval(Duration::from_secs(10));
    let client = ApiClient::new(vec![server.base_url()]);
    let mut session = open_session();
    session.registry.adopt(vec![version("v1", 1, true)]);

    let mut reconciler = PollReconciler::new(&config);
    let t0 = Instant::now();
    reconciler.poll_once(&mut session, &client, t0).await.unwrap();

    assert!(!reconciler.should_poll(&session, &idle_status(), t0 + Duration::from_secs(5)));
    assert!(reconciler.should_poll(&session, &idle_status(), t0 + Duration::from_secs(10)));
}
