// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;
use crate::profile::ProfileStore;
use crate::test_support::FakeMuxClient;

fn ctx() -> ProviderContext {
    ProviderContext {
        terminal_id: "aaaaaaaa".into(),
        session_name: "sess".into(),
        window_name: "win".into(),
        agent_profile: "default".into(),
    }
}

fn provider() -> ClaudeProvider<FakeMuxClient> {
    ClaudeProvider::new(ctx(), Arc::new(FakeMuxClient::new()), Arc::new(ProfileStore::new()))
}

#[tokio::test]
async fn extract_last_message_takes_text_after_final_response_marker() {
    let p = provider();
    let output = "⏺ first answer\n> \n⏺ second answer\nmore text\n> ";
    let extracted = p.extract_last_message(output).await.unwrap();
    assert_eq!(extracted, "second answer\nmore text");
}

#[tokio::test]
async fn extract_last_message_stops_at_separator_line() {
    let p = provider();
    let output = "⏺ the answer\n────────\nstuff below";
    let extracted = p.extract_last_message(output).await.unwrap();
    assert_eq!(extracted, "the answer");
}

#[tokio::test]
async fn extract_last_message_errors_without_response_marker() {
    let p = provider();
    assert!(p.extract_last_message("just a regular prompt\n> ").await.is_err());
}

#[tokio::test]
async fn extract_last_message_strips_ansi_codes() {
    let p = provider();
    let output = "⏺ \x1b[32mgreen text\x1b[0m\n> ";
    let extracted = p.extract_last_message(output).await.unwrap();
    assert_eq!(extracted, "green text");
}

#[tokio::test]
async fn get_status_detects_processing_spinner() {
    let p = provider();
    p.mux.set_history("sess", "win", "✶ Thinking… (esc to interrupt · 12s)");
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::Processing);
}

#[tokio::test]
async fn get_status_detects_waiting_user_answer() {
    let p = provider();
    p.mux.set_history("sess", "win", "❯ 1. yes\n  2. no");
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::WaitingUserAnswer);
}

#[tokio::test]
async fn get_status_detects_completed_when_response_and_prompt_present() {
    let p = provider();
    p.mux.set_history("sess", "win", "⏺ done\n> ");
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::Completed);
}

#[tokio::test]
async fn get_status_detects_idle_with_only_prompt() {
    let p = provider();
    p.mux.set_history("sess", "win", "> ");
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::Idle);
}

#[tokio::test]
async fn get_status_is_error_on_empty_output() {
    let p = provider();
    assert_eq!(p.get_status(None).await.unwrap(), TerminalStatus::Error);
}

#[test]
fn exit_command_is_slash_exit() {
    assert_eq!(provider().exit_command(), "/exit");
}

#[test]
fn idle_pattern_for_log_matches_prompt_marker() {
    let re = Regex::new(provider().idle_pattern_for_log()).unwrap();
    assert!(re.is_match("> "));
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let p = provider();
    assert!(p.cleanup().await.is_ok());
    assert!(p.cleanup().await.is_ok());
}
