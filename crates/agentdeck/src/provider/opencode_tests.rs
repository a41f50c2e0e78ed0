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

fn provider() -> OpencodeProvider<FakeMuxClient> {
    OpencodeProvider::new(ctx(), Arc::new(FakeMuxClient::new()))
}

#[tokio::test]
async fn get_status_is_idle_on_empty_history() {
    let p = provider();
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::Idle);
}

#[tokio::test]
async fn get_status_is_completed_at_prompt_after_finish_event() {
    let p = provider();
    p.mux.set_history("sess", "win", "{\"type\":\"step_finish\",\"messageID\":\"m1\"}\nroot@host:~#");
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::Completed);
}

#[tokio::test]
async fn get_status_is_error_at_prompt_after_error_event() {
    let p = provider();
    p.mux.set_history("sess", "win", "{\"type\":\"error\",\"message\":\"boom\"}\n$ ");
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::Error);
}

#[tokio::test]
async fn get_status_is_idle_at_prompt_with_no_events() {
    let p = provider();
    p.mux.set_history("sess", "win", "$ ");
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::Idle);
}

#[tokio::test]
async fn get_status_is_processing_when_mid_stream() {
    let p = provider();
    p.mux.set_history("sess", "win", "{\"type\":\"text\",\"messageID\":\"m1\",\"text\":\"hi\"}");
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::Processing);
}

#[tokio::test]
async fn extract_last_message_joins_text_for_last_message_id() {
    let p = provider();
    let output = concat!(
        "{\"type\":\"text\",\"messageID\":\"m0\",\"text\":\"old\"}\n",
        "{\"type\":\"text\",\"messageID\":\"m1\",\"text\":\"hello \"}\n",
        "{\"type\":\"text\",\"messageID\":\"m1\",\"text\":\"world\"}\n",
        "{\"type\":\"step_finish\",\"messageID\":\"m1\"}\n",
    );
    assert_eq!(p.extract_last_message(output).await.unwrap(), "hello world");
}

#[tokio::test]
async fn extract_last_message_falls_back_to_raw_output_without_json() {
    let p = provider();
    let output = "plain error text with no json";
    assert_eq!(p.extract_last_message(output).await.unwrap(), output);
}

#[test]
fn exit_command_is_ctrl_c() {
    assert_eq!(provider().exit_command(), "\x03");
}

#[test]
fn idle_pattern_matches_step_finish_variants() {
    let re = Regex::new(provider().idle_pattern_for_log()).unwrap();
    assert!(re.is_match("\"type\": \"step-finish\""));
    assert!(re.is_match("\"type\":\"step_finish\""));
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let p = provider();
    assert!(p.cleanup().await.is_ok());
    assert!(p.cleanup().await.is_ok());
}
