// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stdio tool surface: a line-delimited JSON loop over stdin/stdout
//! calling the same `DelegationTools` functions the HTTP surface calls, so
//! the two transports never diverge in behavior.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::mux::MuxClient;
use crate::tools::{CallerContext, DelegationTools};

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case")]
enum ToolCall {
    Handoff { agent_profile: String, message: String, timeout_secs: u64, cwd: Option<String> },
    Assign { agent_profile: String, message: String, cwd: Option<String> },
    SendMessage { receiver_id: String, message: String },
    CheckInbox { terminal_id: Option<String>, #[serde(default = "default_limit")] limit: usize },
    ListWorkers { session_id: Option<String> },
    Done { message: String },
}

#[derive(Debug, Deserialize)]
struct ToolRequest {
    id: serde_json::Value,
    #[serde(default)]
    caller: CallerContext,
    #[serde(flatten)]
    call: ToolCall,
}

#[derive(Debug, Serialize)]
struct ToolResponse {
    id: serde_json::Value,
    result: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolErrorResponse {
    id: serde_json::Value,
    error: String,
}

async fn dispatch<M: MuxClient + 'static>(tools: &DelegationTools<M>, req: ToolRequest) -> serde_json::Value {
    match req.call {
        ToolCall::Handoff { agent_profile, message, timeout_secs, cwd } => {
            serde_json::to_value(tools.handoff(&req.caller, &agent_profile, &message, timeout_secs, cwd).await)
        }
        ToolCall::Assign { agent_profile, message, cwd } => {
            serde_json::to_value(tools.assign(&req.caller, &agent_profile, &message, cwd).await)
        }
        ToolCall::SendMessage { receiver_id, message } => {
            serde_json::to_value(tools.send_message(&req.caller, &receiver_id, &message).await)
        }
        ToolCall::CheckInbox { terminal_id, limit } => {
            serde_json::to_value(tools.check_inbox(&req.caller, terminal_id.as_deref(), limit).await)
        }
        ToolCall::ListWorkers { session_id } => {
            serde_json::to_value(tools.list_workers(&req.caller, session_id.as_deref()).await)
        }
        ToolCall::Done { message } => serde_json::to_value(tools.done(&req.caller, &message).await),
    }
    .unwrap_or_else(|e| serde_json::json!({ "success": false, "message": format!("failed to serialize result: {e}") }))
}

/// Run the stdio tool loop to completion (stdin EOF). One JSON object per
/// line in, one JSON object per line out.
pub async fn run_stdio_loop<M: MuxClient + 'static>(tools: Arc<DelegationTools<M>>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ToolRequest>(&line) {
            Ok(req) => {
                let id = req.id.clone();
                let result = dispatch(&tools, req).await;
                serde_json::to_string(&ToolResponse { id, result })
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse tool request");
                serde_json::to_string(&ToolErrorResponse { id: serde_json::Value::Null, error: e.to_string() })
            }
        };

        let Ok(mut response) = response else { continue };
        response.push('\n');
        stdout.write_all(response.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod tests;
