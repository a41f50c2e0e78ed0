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
        std::env::temp_dir().join("agentdeck-http-inbox-test"),
    ));
    let tools = Arc::new(DelegationTools::new(service.clone(), store.clone(), registry.clone(), ProviderKind::Opencode, true));
    let config = Arc::new(Config::parse_from(["agentdeck"]));
    let state = Arc::new(AppState::new(store.clone(), service, tools, registry, config));
    (build_router(state), store)
}

#[tokio::test]
async fn enqueue_then_list_messages() {
    let (app, _store) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let resp = server.post("/terminals/receiver1/inbox/messages?sender_id=sender1&message=hi").await;
    resp.assert_status(StatusCode::OK);

    let resp = server.get("/terminals/receiver1/inbox/messages").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["messages"][0]["message"], "hi");
}

#[tokio::test]
async fn list_messages_rejects_limit_over_max() {
    let (app, _store) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let resp = server.get("/terminals/receiver1/inbox/messages?limit=101").await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_messages_accepts_limit_at_max() {
    let (app, _store) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    let resp = server.get("/terminals/receiver1/inbox/messages?limit=100").await;
    resp.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn list_messages_filters_by_status() {
    let (app, store) = harness();
    let server = axum_test::TestServer::new(app).expect("create test server");

    server.post("/terminals/receiver1/inbox/messages?message=hi").await;
    let pending = store.list_pending_messages("receiver1", 10).await;
    store.update_message_status(pending[0].id, crate::store::MessageStatus::Delivered).await;

    let resp = server.get("/terminals/receiver1/inbox/messages?status=delivered").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["count"], 1);

    let resp = server.get("/terminals/receiver1/inbox/messages?status=pending").await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["count"], 0);
}
