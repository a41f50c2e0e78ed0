// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use clap::Parser;

use crate::config::Config;
use crate::profile::ProfileStore;
use crate::provider::ProviderRegistry;
use crate::service::TerminalService;
use crate::store::Store;
use crate::test_support::FakeMuxClient;
use crate::tools::DelegationTools;
use crate::transport::http::build_router;
use crate::transport::state::AppState;

fn harness() -> (Router, Arc<Store>, Arc<FakeMuxClient>) {
    let store = Arc::new(Store::in_memory());
    let mux = Arc::new(FakeMuxClient::new());
    let profiles = Arc::new(ProfileStore::new());
    let registry = Arc::new(ProviderRegistry::new(mux.clone(), profiles.clone(), "http://opencode:3000".into()));
    let service = Arc::new(TerminalService::new(
        store.clone(),
        mux.clone(),
        registry.clone(),
        profiles,
        std::env::temp_dir().join("agentdeck-http-terminals-test"),
    ));
    let tools = Arc::new(DelegationTools::new(
        service.clone(),
        store.clone(),
        registry.clone(),
        crate::config::ProviderKind::Opencode,
        true,
    ));
    let config = Arc::new(Config::parse_from(["agentdeck"]));
    let state = Arc::new(AppState::new(store.clone(), service, tools, registry, config));
    (build_router(state), store, mux)
}

#[tokio::test]
async fn create_session_starts_idle() {
    let (app, _store, _mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let resp = server.post("/sessions").json(&serde_json::json!({"agent_profile": "developer"})).await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "IDLE");
}

#[tokio::test]
async fn create_session_rejects_unknown_provider() {
    let (app, _store, _mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let resp = server
        .post("/sessions")
        .json(&serde_json::json!({"agent_profile": "developer", "provider": "not-a-provider"}))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_terminal_in_existing_session_adds_window() {
    let (app, _store, _mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let first = server.post("/sessions").json(&serde_json::json!({"agent_profile": "developer"})).await;
    let first_body: serde_json::Value = first.json();
    let session = first_body["session_name"].as_str().unwrap();

    let resp = server
        .post(&format!("/sessions/{session}/terminals"))
        .json(&serde_json::json!({"agent_profile": "reviewer"}))
        .await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["session_name"], session);
}

#[tokio::test]
async fn create_terminal_in_missing_session_404s() {
    let (app, _store, _mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let resp = server
        .post("/sessions/does-not-exist/terminals")
        .json(&serde_json::json!({"agent_profile": "developer"}))
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_terminal_roundtrips() {
    let (app, _store, _mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let created: serde_json::Value =
        server.post("/sessions").json(&serde_json::json!({"agent_profile": "developer"})).await.json();
    let id = created["id"].as_str().unwrap();

    let resp = server.get(&format!("/terminals/{id}")).await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["id"], id);
}

#[tokio::test]
async fn get_terminal_missing_404s() {
    let (app, _store, _mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let resp = server.get("/terminals/missing").await;
    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn by_delegating_agent_finds_subagent() {
    let (app, store, _mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let created: serde_json::Value = server
        .post("/sessions")
        .json(&serde_json::json!({"agent_profile": "developer", "delegating_agent_id": "sup1"}))
        .await
        .json();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(store.get_terminal(&id).await.is_some());

    let resp = server.get("/terminals/by-delegating-agent/sup1").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["id"], id);
}

#[tokio::test]
async fn send_input_then_read_output() {
    let (app, _store, mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let created: serde_json::Value =
        server.post("/sessions").json(&serde_json::json!({"agent_profile": "developer"})).await.json();
    let id = created["id"].as_str().unwrap();
    let session = created["session_name"].as_str().unwrap();
    let name = created["name"].as_str().unwrap();
    mux.set_history(session, name, "hello from the pane");

    let resp = server.post(&format!("/terminals/{id}/input")).json(&serde_json::json!({"message": "hi"})).await;
    resp.assert_status(StatusCode::OK);
    assert_eq!(mux.sent_keys.lock().unwrap().last().unwrap().2, "hi");

    let resp = server.get(&format!("/terminals/{id}/output?mode=full")).await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["output"], "hello from the pane");
}

#[tokio::test]
async fn get_output_rejects_invalid_mode() {
    let (app, _store, _mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let created: serde_json::Value =
        server.post("/sessions").json(&serde_json::json!({"agent_profile": "developer"})).await.json();
    let id = created["id"].as_str().unwrap();

    let resp = server.get(&format!("/terminals/{id}/output?mode=bogus")).await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_terminal_removes_it() {
    let (app, store, _mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let created: serde_json::Value =
        server.post("/sessions").json(&serde_json::json!({"agent_profile": "developer"})).await.json();
    let id = created["id"].as_str().unwrap().to_string();

    let resp = server.delete(&format!("/terminals/{id}")).await;
    resp.assert_status(StatusCode::OK);
    assert!(store.get_terminal(&id).await.is_none());
}

#[tokio::test]
async fn get_working_directory_returns_pane_cwd() {
    let (app, _store, mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let created: serde_json::Value =
        server.post("/sessions").json(&serde_json::json!({"agent_profile": "developer"})).await.json();
    let id = created["id"].as_str().unwrap();
    let session = created["session_name"].as_str().unwrap();
    let name = created["name"].as_str().unwrap();
    mux.pane_cwds.lock().unwrap().insert((session.to_string(), name.to_string()), "/workspace".to_string());

    let resp = server.get(&format!("/terminals/{id}/working-directory")).await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["cwd"], "/workspace");
}

#[tokio::test]
async fn send_exit_sends_providers_exit_command() {
    let (app, _store, mux) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let created: serde_json::Value = server
        .post("/sessions")
        .json(&serde_json::json!({"agent_profile": "developer", "provider": "claude"}))
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    let resp = server.post(&format!("/terminals/{id}/exit")).await;
    resp.assert_status(StatusCode::OK);
    assert_eq!(mux.sent_keys.lock().unwrap().last().unwrap().2, "/exit");
}
