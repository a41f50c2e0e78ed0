// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::terminal::{now_ms, ProviderKindWire};

fn sample_terminal(id: &str, session: &str) -> Terminal {
    Terminal {
        id: id.to_string(),
        name: format!("{session}-window"),
        provider: ProviderKindWire::Claude,
        session_name: session.to_string(),
        agent_profile: "default".to_string(),
        delegating_agent_id: None,
        initial_message: None,
        last_active_ms: now_ms(),
    }
}

#[tokio::test]
async fn create_and_get_terminal_round_trips() {
    let store = Store::in_memory();
    store.create_terminal(sample_terminal("aaaaaaaa", "sess1")).await;

    let fetched = store.get_terminal("aaaaaaaa").await.expect("terminal present");
    assert_eq!(fetched.session_name, "sess1");
    assert!(store.get_terminal("missing").await.is_none());
}

#[tokio::test]
async fn list_by_session_filters_correctly() {
    let store = Store::in_memory();
    store.create_terminal(sample_terminal("aaaaaaaa", "sess1")).await;
    store.create_terminal(sample_terminal("bbbbbbbb", "sess1")).await;
    store.create_terminal(sample_terminal("cccccccc", "sess2")).await;

    let workers = store.list_terminals_by_session("sess1").await;
    assert_eq!(workers.len(), 2);
}

#[tokio::test]
async fn get_by_delegating_agent_finds_worker() {
    let store = Store::in_memory();
    let mut worker = sample_terminal("bbbbbbbb", "sess1");
    worker.delegating_agent_id = Some("aaaaaaaa".to_string());
    store.create_terminal(worker).await;

    let found = store.get_terminal_by_delegating_agent("aaaaaaaa").await;
    assert_eq!(found.unwrap().id, "bbbbbbbb");
}

#[tokio::test]
async fn delete_terminal_removes_it() {
    let store = Store::in_memory();
    store.create_terminal(sample_terminal("aaaaaaaa", "sess1")).await;
    assert!(store.delete_terminal("aaaaaaaa").await);
    assert!(store.get_terminal("aaaaaaaa").await.is_none());
    assert!(!store.delete_terminal("aaaaaaaa").await);
}

#[tokio::test]
async fn inbox_messages_ordered_oldest_first_and_capped() {
    let store = Store::in_memory();
    store.create_inbox_message(Some("a".into()), "worker".into(), "first".into()).await;
    store.create_inbox_message(Some("a".into()), "worker".into(), "second".into()).await;
    store.create_inbox_message(Some("a".into()), "worker".into(), "third".into()).await;

    let pending = store.list_pending_messages("worker", 2).await;
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].message, "first");
    assert_eq!(pending[1].message, "second");
}

#[tokio::test]
async fn update_message_status_filters_by_status() {
    let store = Store::in_memory();
    let msg = store.create_inbox_message(None, "worker".into(), "hello".into()).await;
    store.update_message_status(msg.id, MessageStatus::Delivered).await;

    let pending = store.list_pending_messages("worker", 10).await;
    assert!(pending.is_empty());

    let delivered = store.list_inbox_messages("worker", Some(MessageStatus::Delivered), 10).await;
    assert_eq!(delivered.len(), 1);
}

#[tokio::test]
async fn store_open_replays_wal_across_restarts() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;

    {
        let store = Store::open(tmp.path());
        store.create_terminal(sample_terminal("aaaaaaaa", "sess1")).await;
        store.create_inbox_message(None, "aaaaaaaa".into(), "hi".into()).await;
    }

    let reopened = Store::open(tmp.path());
    assert!(reopened.get_terminal("aaaaaaaa").await.is_some());
    let pending = reopened.list_pending_messages("aaaaaaaa", 10).await;
    assert_eq!(pending.len(), 1);
    Ok(())
}

#[tokio::test]
async fn store_open_replays_deletes_as_tombstones() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;

    {
        let store = Store::open(tmp.path());
        store.create_terminal(sample_terminal("aaaaaaaa", "sess1")).await;
        store.delete_terminal("aaaaaaaa").await;
    }

    let reopened = Store::open(tmp.path());
    assert!(reopened.get_terminal("aaaaaaaa").await.is_none());
    Ok(())
}

#[tokio::test]
async fn flows_crud() {
    let store = Store::in_memory();
    store
        .create_flow(Flow {
            name: "nightly".into(),
            file_path: "/flows/nightly.yaml".into(),
            schedule: "0 0 * * *".into(),
            agent_profile: "default".into(),
            provider: ProviderKindWire::Opencode,
            script: String::new(),
            last_run_ms: None,
            next_run_ms: None,
            enabled: true,
        })
        .await;

    assert_eq!(store.list_flows().await.len(), 1);
    let mut flow = store.get_flow("nightly").await.unwrap();
    flow.enabled = false;
    store.update_flow(flow).await;
    assert!(!store.get_flow("nightly").await.unwrap().enabled);
    assert!(store.delete_flow("nightly").await);
}
