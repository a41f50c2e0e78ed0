// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use clap::Parser;

use crate::config::{Config, ProviderKind};
use crate::profile::ProfileStore;
use crate::provider::ProviderRegistry;
use crate::service::TerminalService;
use crate::store::Store;
use crate::test_support::FakeMuxClient;
use crate::tools::DelegationTools;
use crate::transport::http::build_router;
use crate::transport::state::AppState;

fn harness() -> (Router, Arc<Store>) {
    let store = Arc::new(Store::in_memory());
    let mux = Arc::new(FakeMuxClient::new());
    let profiles = Arc::new(ProfileStore::new());
    let registry = Arc::new(ProviderRegistry::new(mux.clone(), profiles.clone(), "http://opencode:3000".into()));
    let service = Arc::new(TerminalService::new(
        store.clone(),
        mux.clone(),
        registry.clone(),
        profiles,
        std::env::temp_dir().join("agentdeck-http-sessions-test"),
    ));
    let tools = Arc::new(DelegationTools::new(service.clone(), store.clone(), registry.clone(), ProviderKind::Opencode, true));
    let config = Arc::new(Config::parse_from(["agentdeck"]));
    let state = Arc::new(AppState::new(store.clone(), service, tools, registry, config));
    (build_router(state), store)
}

#[tokio::test]
async fn list_workers_returns_all_terminals_in_session() {
    let (app, _store) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let created: serde_json::Value =
        server.post("/sessions").json(&serde_json::json!({"agent_profile": "developer"})).await.json();
    let session = created["session_name"].as_str().unwrap();
    server.post(&format!("/sessions/{session}/terminals")).json(&serde_json::json!({"agent_profile": "reviewer"})).await;

    let resp = server.get(&format!("/sessions/{session}/workers")).await;
    resp.assert_status(StatusCode::OK);
    let body: Vec<serde_json::Value> = resp.json();
    assert_eq!(body.len(), 2);
}

#[tokio::test]
async fn list_workers_empty_for_unknown_session() {
    let (app, _store) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let resp = server.get("/sessions/nope/workers").await;
    resp.assert_status(StatusCode::OK);
    let body: Vec<serde_json::Value> = resp.json();
    assert!(body.is_empty());
}
