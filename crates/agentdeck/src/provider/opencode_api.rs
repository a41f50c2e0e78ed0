// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use serde::Deserialize;

use super::{Provider, ProviderContext};
use crate::store::terminal::TerminalStatus;

/// HTTP-backed provider talking directly to an `opencode` server. The tmux
/// `session_name` doubles as the remote session id.
pub struct OpencodeApiProvider {
    ctx: ProviderContext,
    base_url: String,
    client: reqwest::Client,
}

impl OpencodeApiProvider {
    pub fn new(ctx: ProviderContext, base_url: String) -> Self {
        Self { ctx, base_url, client: reqwest::Client::new() }
    }
}

#[derive(Debug, Deserialize)]
struct MessagePart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct MessageInfo {
    #[serde(default)]
    role: String,
}

#[derive(Debug, Deserialize)]
struct SessionMessage {
    info: MessageInfo,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[async_trait]
impl Provider for OpencodeApiProvider {
    async fn initialize(&self) -> anyhow::Result<()> {
        let resp = self.client.get(format!("{}/health", self.base_url)).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            anyhow::bail!("opencode api health check failed: {}", resp.status())
        }
    }

    async fn send_input(&self, message: &str) -> anyhow::Result<()> {
        let url = format!("{}/session/{}/prompt_async", self.base_url, self.ctx.session_name);
        let payload = serde_json::json!({
            "parts": [{"type": "text", "text": message}],
            "agent": self.ctx.agent_profile,
        });
        self.client.post(url).json(&payload).send().await?.error_for_status()?;
        Ok(())
    }

    /// The remote server owns queuing and batching; agentdeck never polls
    /// it for progress.
    async fn get_status(&self, _tail_lines: Option<usize>) -> anyhow::Result<TerminalStatus> {
        Ok(TerminalStatus::Idle)
    }

    async fn extract_last_message(&self, _script_output: &str) -> anyhow::Result<String> {
        let url = format!("{}/session/{}/messages", self.base_url, self.ctx.session_name);
        let messages: Vec<SessionMessage> = self.client.get(url).send().await?.error_for_status()?.json().await?;

        for entry in messages.iter().rev() {
            if entry.info.role != "assistant" {
                continue;
            }
            let text: String =
                entry.parts.iter().filter(|p| p.kind == "text").map(|p| p.text.as_str()).collect();
            return Ok(text.trim().to_string());
        }

        anyhow::bail!("no assistant message found in session history")
    }

    /// There's no local terminal state to gate on for this provider.
    fn idle_pattern_for_log(&self) -> &str {
        ".*"
    }

    fn exit_command(&self) -> &str {
        ""
    }

    /// Releases the remote session rather than just the local `reqwest`
    /// client — best-effort, since the worker is gone either way.
    async fn cleanup(&self) -> anyhow::Result<()> {
        let url = format!("{}/session/{}", self.base_url, self.ctx.session_name);
        if let Err(e) = self.client.delete(url).send().await {
            tracing::warn!(terminal_id = %self.ctx.terminal_id, error = %e, "failed to release opencode api session");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "opencode_api_tests.rs"]
mod tests;
