// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Static regexes are constant strings validated by the test suite; treat a
// construction failure as a programmer error, not a runtime condition.
#![allow(clippy::expect_used)]

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use super::{Provider, ProviderContext};
use crate::mux::MuxClient;
use crate::store::terminal::TerminalStatus;

static ANSI_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"));
static IDLE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)(agents|commands)\s*$").expect("static regex"));
static PROCESSING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"esc\s+(interrupt|again to interrupt)").expect("static regex"));

/// An `opencode attach` TUI driven by an external proxy; the pane only ever
/// presents already-rendered output, so status is never tracked locally.
pub struct OpencodeAttachProvider<M: MuxClient> {
    ctx: ProviderContext,
    mux: Arc<M>,
}

impl<M: MuxClient> OpencodeAttachProvider<M> {
    pub fn new(ctx: ProviderContext, mux: Arc<M>) -> Self {
        Self { ctx, mux }
    }
}

#[async_trait]
impl<M: MuxClient> Provider for OpencodeAttachProvider<M> {
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_input(&self, message: &str) -> anyhow::Result<()> {
        self.mux.send_keys(&self.ctx.session_name, &self.ctx.window_name, message).await
    }

    /// The TUI is strictly a presentation layer over a queue the server
    /// owns; it's always ready to receive input keys.
    async fn get_status(&self, _tail_lines: Option<usize>) -> anyhow::Result<TerminalStatus> {
        Ok(TerminalStatus::Idle)
    }

    async fn extract_last_message(&self, script_output: &str) -> anyhow::Result<String> {
        extract_last_message_sync(script_output)
    }

    fn idle_pattern_for_log(&self) -> &str {
        ".*"
    }

    fn exit_command(&self) -> &str {
        "\x03"
    }

    /// No resources held beyond the tmux pane itself.
    async fn cleanup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

fn extract_last_message_sync(script_output: &str) -> anyhow::Result<String> {
    let cleaned = ANSI_CODE.replace_all(script_output, "");
    let mut message_parts: Vec<&str> = Vec::new();
    let mut in_message = false;

    for line in cleaned.lines().rev() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }

        if IDLE_LINE.is_match(stripped) {
            if !message_parts.is_empty() {
                break;
            }
            continue;
        }

        if PROCESSING_LINE.is_match(stripped) {
            message_parts.clear();
            continue;
        }

        if !in_message {
            in_message = true;
        }

        if in_message {
            let lower = stripped.to_lowercase();
            if lower.contains("esc") && (lower.contains("interrupt") || lower.contains("again")) {
                continue;
            }
            message_parts.insert(0, stripped);
        }
    }

    let result = message_parts.join("\n").trim().to_string();
    if result.is_empty() {
        anyhow::bail!("no message found in opencode attach tui output");
    }
    Ok(result)
}

#[cfg(test)]
#[path = "opencode_attach_tests.rs"]
mod tests;
