mod common;

use common::*;
use draftloom::client::wire::{ImportRequest, WorkflowPatch};
use draftloom::client::{ApiClient, ApiError};
use draftloom::session::{EditorSession, SessionError};
use draftloom::types::DeviceType;
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn workflow_list_round_trips() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows");
            then.status(200).json_body(json!([{
                "id": "wf-1",
                "slug": "demo",
                "display_name": "Demo",
                "active_version_id": "v-1",
                "is_chatkit_default": true,
            }]));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let workflows = client.list_workflows().await.unwrap();
    assert_eq!(workflows.len(), 1);
    assert_eq!(workflows[0].slug, "demo");
    assert!(workflows[0].is_chatkit_default);
}

#[tokio::test]
async fn disallowed_delete_surfaces_the_detail() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/workflows/wf-1");
            then.status(400)
                .json_body(json!({"detail": "default workflow cannot be deleted"}));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let err = client.delete_workflow("wf-1").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.user_message(), "default workflow cannot be deleted");
}

#[test]
fn chatkit_default_workflow_is_protected_before_any_network_call() {
    let mut summary = workflow_summary("wf-1");
    summary.is_chatkit_default = true;
    let err = EditorSession::ensure_workflow_deletable(&summary).unwrap_err();
    assert!(matches!(err, SessionError::ProtectedWorkflow));
}

#[tokio::test]
async fn rename_patch_only_sends_set_fields() {
    let server = MockServer::start_async().await;
    let patch_mock = server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/api/workflows/wf-1")
                .json_body(json!({"display_name": "Renamed"}));
            then.status(200).json_body(json!({
                "id": "wf-1",
                "slug": "demo",
                "display_name": "Renamed",
            }));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let updated = client
        .update_workflow(
            "wf-1",
            &WorkflowPatch {
                display_name: Some("Renamed".to_string()),
                slug: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.display_name, "Renamed");
    assert_eq!(patch_mock.hits_async().await, 1);
}

#[tokio::test]
async fn export_returns_the_raw_graph_json() {
    let server = MockServer::start_async().await;
    let graph = seeded_graph();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/wf-1/versions/v-1/export");
            then.status(200).json_body(serde_json::to_value(graph.payload()).unwrap());
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let exported = client.export_version("wf-1", "v-1").await.unwrap();
    assert_eq!(exported["nodes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn promote_posts_the_version_id() {
    let server = MockServer::start_async().await;
    let promote = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/workflows/wf-1/production")
                .json_body(json!({"version_id": "v-2"}));
            then.status(200)
                .json_body(version_response_body("v-2", 2, &seeded_graph()));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let response = client.promote_version("wf-1", "v-2").await.unwrap();
    assert_eq!(response.id, "v-2");
    assert_eq!(promote.hits_async().await, 1);
}

#[tokio::test]
async fn import_endpoint_accepts_a_parsed_bundle() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/workflows/import");
            then.status(200)
                .json_body(version_response_body("v-1", 1, &seeded_graph()));
        })
        .await;

    let bundle =
        draftloom::import::parse_import(&serde_json::to_vec(&seeded_graph().payload()).unwrap())
            .unwrap();
    let request = ImportRequest {
        graph: bundle.graph,
        workflow_id: None,
        slug: Some("imported".to_string()),
        display_name: Some("Imported".to_string()),
        description: None,
        mark_as_active: bundle.mark_as_active,
        version_name: bundle.version_name,
    };

    let client = ApiClient::new(vec![server.base_url()]);
    let response = client.import_workflow(&request).await.unwrap();
    assert_eq!(response.workflow_id, "wf-1");
}

#[tokio::test]
async fn viewport_table_round_trips() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/viewports");
            then.status(200).json_body(json!({"viewports": [{
                "workflow_id": "wf-1",
                "version_id": "v-1",
                "device_type": "desktop",
                "x": 12.0,
                "y": -8.0,
                "zoom": 1.5,
            }]}));
        })
        .await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/workflows/viewports");
            then.status(200).json_body(json!({"viewports": []}));
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let records = client.get_viewports().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].device_type, DeviceType::Desktop);

    client.put_viewports(records).await.unwrap();
    assert_eq!(put.hits_async().await, 1);
}

#[tokio::test]
async fn exhausting_every_candidate_reports_transport_failure() {
    let client = ApiClient::new(vec![
        "http://127.0.0.1:9".to_string(),
        "http://127.0.0.1:10".to_string(),
    ]);
    let err = client.list_workflows().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
}

#[tokio::test]
async fn missing_detail_body_falls_back_to_a_generic_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows");
            then.status(500).body("boom");
        })
        .await;

    let client = ApiClient::new(vec![server.base_url()]);
    let err = client.list_workflows().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), "request failed with status 500");
}
