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
use crate::profile::ProfileStore;
use crate::store::terminal::TerminalStatus;

static ANSI_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"));
static RESPONSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"⏺(?:\x1b\[[0-9;]*m)*\s+").expect("static regex"));
static PROCESSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[✶✢✽✻·✳].*….*\(esc to interrupt.*\)").expect("static regex"));
static IDLE_PROMPT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">[\s\u{a0}]").expect("static regex"));
static WAITING_USER_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"❯.*\d+\.").expect("static regex"));
static NEXT_PROMPT_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>\s").expect("static regex"));

const IDLE_PATTERN_FOR_LOG: &str = r">[\s\u{a0}]";

/// The TUI-decorated `claude` CLI, driven entirely by regexes over raw tmux
/// pane text.
pub struct ClaudeProvider<M: MuxClient> {
    ctx: ProviderContext,
    mux: Arc<M>,
    profiles: Arc<ProfileStore>,
}

impl<M: MuxClient> ClaudeProvider<M> {
    pub fn new(ctx: ProviderContext, mux: Arc<M>, profiles: Arc<ProfileStore>) -> Self {
        Self { ctx, mux, profiles }
    }

    /// Builds the launch command, escaping the agent profile's system
    /// prompt so tmux's keystroke chunking doesn't corrupt embedded
    /// newlines.
    fn build_command(&self) -> String {
        let mut parts = vec!["claude".to_string()];
        let profile = self.profiles.resolve(&self.ctx.agent_profile);

        if let Some(system_prompt) = profile.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            let escaped = system_prompt.replace('\\', "\\\\").replace('\n', "\\n");
            parts.push("--append-system-prompt".to_string());
            parts.push(shell_quote(&escaped));
        }

        if let Some(mcp_servers) = &profile.mcp_servers {
            let mcp_json = serde_json::json!({ "mcpServers": mcp_servers }).to_string();
            parts.push("--mcp-config".to_string());
            parts.push(shell_quote(&mcp_json));
        }

        parts.join(" ")
    }
}

/// Single-quote a shell argument, escaping embedded single quotes.
fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}

#[async_trait]
impl<M: MuxClient> Provider for ClaudeProvider<M> {
    async fn initialize(&self) -> anyhow::Result<()> {
        let command = self.build_command();
        self.mux.send_keys(&self.ctx.session_name, &self.ctx.window_name, &command).await
    }

    async fn send_input(&self, message: &str) -> anyhow::Result<()> {
        self.mux.send_keys(&self.ctx.session_name, &self.ctx.window_name, message).await
    }

    async fn get_status(&self, tail_lines: Option<usize>) -> anyhow::Result<TerminalStatus> {
        let output =
            self.mux.get_history(&self.ctx.session_name, &self.ctx.window_name, tail_lines).await?;

        if output.is_empty() {
            return Ok(TerminalStatus::Error);
        }
        if PROCESSING.is_match(&output) {
            return Ok(TerminalStatus::Processing);
        }
        if WAITING_USER_ANSWER.is_match(&output) {
            return Ok(TerminalStatus::WaitingUserAnswer);
        }
        if RESPONSE.is_match(&output) && IDLE_PROMPT.is_match(&output) {
            return Ok(TerminalStatus::Completed);
        }
        if IDLE_PROMPT.is_match(&output) {
            return Ok(TerminalStatus::Idle);
        }
        Ok(TerminalStatus::Error)
    }

    async fn extract_last_message(&self, script_output: &str) -> anyhow::Result<String> {
        let last_match = RESPONSE
            .find_iter(script_output)
            .last()
            .ok_or_else(|| anyhow::anyhow!("no claude response found: no response marker detected"))?;

        let remaining = &script_output[last_match.end()..];
        let mut response_lines = Vec::new();
        for line in remaining.split('\n') {
            if NEXT_PROMPT_LINE.is_match(line) || line.contains("────────") {
                break;
            }
            response_lines.push(line.trim());
        }

        if response_lines.iter().all(|l| l.is_empty()) {
            anyhow::bail!("empty claude response: no content found after response marker");
        }

        let joined = response_lines.join("\n");
        Ok(ANSI_CODE.replace_all(joined.trim(), "").trim().to_string())
    }

    fn idle_pattern_for_log(&self) -> &str {
        IDLE_PATTERN_FOR_LOG
    }

    fn exit_command(&self) -> &str {
        "/exit"
    }

    /// No resources held beyond the tmux pane itself.
    async fn cleanup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
