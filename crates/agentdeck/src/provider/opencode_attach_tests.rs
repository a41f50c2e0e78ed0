// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;
use crate::test_support::FakeMuxClient;

fn ctx() -> ProviderContext {
    ProviderContext {
        terminal_id: "aaaaaaaa".into(),
        session_name: "sess".into(),
        window_name: "win".into(),
        agent_profile: "default".into(),
    }
}

fn provider() -> OpencodeAttachProvider<FakeMuxClient> {
    OpencodeAttachProvider::new(ctx(), Arc::new(FakeMuxClient::new()))
}

#[tokio::test]
async fn get_status_is_always_idle() {
    assert_eq!(provider().get_status(None).await.unwrap(), TerminalStatus::Idle);
}

#[tokio::test]
async fn extract_last_message_collects_lines_before_idle_marker() {
    let p = provider();
    let output = "here is the reply\nsecond line\nclaude-3 · 2 agents\n";
    let message = p.extract_last_message(output).await.unwrap();
    assert_eq!(message, "here is the reply\nsecond line");
}

#[tokio::test]
async fn extract_last_message_discards_content_seen_after_a_spinner() {
    // Walking backward, hitting a processing-spinner line discards whatever
    // had already been accumulated (it postdates the spinner) and resumes
    // collecting from older lines.
    let p = provider();
    let output = "stale partial output\nesc interrupt\nfinal reply\nclaude-3 · 2 agents\n";
    let message = p.extract_last_message(output).await.unwrap();
    assert_eq!(message, "stale partial output");
}

#[tokio::test]
async fn extract_last_message_errors_on_empty_output() {
    let p = provider();
    assert!(p.extract_last_message("").await.is_err());
}

#[tokio::test]
async fn send_input_relays_literal_keystrokes() {
    let p = provider();
    p.send_input("hello there").await.unwrap();
    assert_eq!(p.mux.sent_keys.lock().unwrap().last().unwrap().2, "hello there");
}

#[test]
fn exit_command_is_ctrl_c() {
    assert_eq!(provider().exit_command(), "\x03");
}

#[test]
fn idle_pattern_matches_everything() {
    assert_eq!(provider().idle_pattern_for_log(), ".*");
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let p = provider();
    assert!(p.cleanup().await.is_ok());
    assert!(p.cleanup().await.is_ok());
}
