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
static ESCAPE_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[?0-9;]*[a-zA-Z]").expect("static regex"));
static CONTROL_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f-\x9f]").expect("static regex"));
static SHELL_PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[#$]|root@.*[#$])\s*$").expect("static regex"));
static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{.*\}").expect("static regex"));

const IDLE_PATTERN_FOR_LOG: &str = r#""type":\s*"step[_-]finish""#;

fn clean(output: &str) -> String {
    let no_ansi = ANSI_CODE.replace_all(output, "");
    let no_escape = ESCAPE_SEQUENCE.replace_all(&no_ansi, "");
    CONTROL_CHAR.replace_all(&no_escape, "").into_owned()
}

fn normalize_event_type(value: &serde_json::Value) -> String {
    value.get("type").and_then(|t| t.as_str()).unwrap_or("").replace('-', "_")
}

/// Scan `clean_output` in reverse for the last `{...}` object on each line
/// and attempt to parse it, yielding the well-formed objects in reverse
/// encounter order.
fn parse_trailing_json_objects(clean_output: &str) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    for line in clean_output.lines().rev() {
        let Some(m) = JSON_OBJECT.find(line) else { continue };
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(m.as_str()) {
            out.push(value);
        }
    }
    out
}

/// Extract every well-formed JSON object embedded in `collapsed`, in
/// forward order, tolerating arbitrary text between objects.
fn parse_all_json_objects(collapsed: &str) -> Vec<serde_json::Value> {
    let bytes = collapsed.as_bytes();
    let mut objects = Vec::new();
    let mut pos = 0usize;
    while pos < bytes.len() {
        let Some(rel_start) = collapsed[pos..].find('{') else { break };
        let start = pos + rel_start;
        let mut deserializer = serde_json::Deserializer::from_str(&collapsed[start..]).into_iter::<serde_json::Value>();
        match deserializer.next() {
            Some(Ok(value)) => {
                let consumed = deserializer.byte_offset();
                objects.push(value);
                pos = start + consumed.max(1);
            }
            _ => pos = start + 1,
        }
    }
    objects
}

/// The JSON-streaming `opencode run` CLI, launched fresh per turn via a
/// heredoc.
pub struct OpencodeProvider<M: MuxClient> {
    ctx: ProviderContext,
    mux: Arc<M>,
}

impl<M: MuxClient> OpencodeProvider<M> {
    pub fn new(ctx: ProviderContext, mux: Arc<M>) -> Self {
        Self { ctx, mux }
    }
}

#[async_trait]
impl<M: MuxClient> Provider for OpencodeProvider<M> {
    async fn initialize(&self) -> anyhow::Result<()> {
        // `opencode run` is one-shot per turn; the shell just needs to be
        // ready, which tmux guarantees once the window exists.
        Ok(())
    }

    async fn send_input(&self, message: &str) -> anyhow::Result<()> {
        let command = format!(
            "opencode run --format json --continue --agent {} << 'EOF_OPENCODE'\n{}\nEOF_OPENCODE",
            self.ctx.agent_profile, message
        );
        self.mux.send_keys(&self.ctx.session_name, &self.ctx.window_name, &command).await
    }

    async fn get_status(&self, tail_lines: Option<usize>) -> anyhow::Result<TerminalStatus> {
        let output =
            self.mux.get_history(&self.ctx.session_name, &self.ctx.window_name, tail_lines).await?;

        if output.trim().is_empty() {
            return Ok(TerminalStatus::Idle);
        }

        let cleaned = clean(&output);
        let lines: Vec<&str> = cleaned.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let collapsed = cleaned.replace(['\n', '\r'], "");

        let has_finish_event = collapsed.contains("\"type\":\"step-finish\"")
            || collapsed.contains("\"type\":\"step_finish\"")
            || collapsed.contains("\"type\": \"step-finish\"")
            || collapsed.contains("\"type\": \"step_finish\"");
        let has_error_event =
            collapsed.contains("\"type\":\"error\"") || collapsed.contains("\"type\": \"error\"");

        let at_prompt = lines.last().is_some_and(|last| SHELL_PROMPT.is_match(last));

        if at_prompt {
            if has_finish_event {
                return Ok(TerminalStatus::Completed);
            }
            if has_error_event {
                return Ok(TerminalStatus::Error);
            }
            return Ok(TerminalStatus::Idle);
        }

        for event in parse_trailing_json_objects(&cleaned) {
            let event_type = normalize_event_type(&event);
            match event_type.as_str() {
                "step_start" | "text" | "call" | "result" | "tool_use" | "step_finish" => {
                    return Ok(TerminalStatus::Processing);
                }
                "error" => return Ok(TerminalStatus::Error),
                _ => continue,
            }
        }

        Ok(TerminalStatus::Processing)
    }

    async fn extract_last_message(&self, script_output: &str) -> anyhow::Result<String> {
        let cleaned = clean(script_output);
        let collapsed = cleaned.replace(['\n', '\r'], "");
        let objects = parse_all_json_objects(&collapsed);

        let last_message_id = objects
            .iter()
            .rev()
            .find(|event| normalize_event_type(event) == "step_finish")
            .and_then(|event| {
                event
                    .get("messageID")
                    .or_else(|| event.get("part").and_then(|p| p.get("messageID")))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            });

        let mut parts = Vec::new();
        for event in &objects {
            if normalize_event_type(event) != "text" {
                continue;
            }
            let msg_id = event
                .get("messageID")
                .or_else(|| event.get("part").and_then(|p| p.get("messageID")))
                .and_then(|v| v.as_str());

            if last_message_id.is_some() && msg_id != last_message_id.as_deref() {
                continue;
            }

            let text = event
                .get("part")
                .and_then(|p| p.get("text"))
                .and_then(|v| v.as_str())
                .or_else(|| event.get("text").and_then(|v| v.as_str()));
            if let Some(text) = text {
                parts.push(text.to_string());
            }
        }

        let joined = parts.concat().trim().to_string();
        if !joined.is_empty() {
            return Ok(joined);
        }

        let fallback = cleaned.trim();
        if !fallback.is_empty() {
            return Ok(fallback.to_string());
        }
        Ok(script_output.trim().to_string())
    }

    fn idle_pattern_for_log(&self) -> &str {
        IDLE_PATTERN_FOR_LOG
    }

    fn exit_command(&self) -> &str {
        "\x03"
    }

    /// No resources held beyond the tmux pane itself.
    async fn cleanup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "opencode_tests.rs"]
mod tests;
