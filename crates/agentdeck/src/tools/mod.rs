// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The delegation tools (`handoff`, `assign`, `send_message`, `check_inbox`,
//! `list_workers`, `done`) shared between the HTTP surface and the stdio
//! tool loop. Plain async functions over a `TerminalService`/`Store` pair —
//! neither transport owns tool logic of its own.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ProviderKind;
use crate::mux::MuxClient;
use crate::provider::ProviderRegistry;
use crate::service::{CreateTerminalParams, OutputMode, TerminalService};
use crate::store::terminal::TerminalStatus;
use crate::store::{InboxMessage, Store, Terminal};

const IDLE_WAIT_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const SUBAGENT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Matches an agent-internal session id (e.g. an OpenCode `sessionID`) in a
/// tail of pane history.
static SESSION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""sessionID"\s*:\s*"(ses_[A-Za-z0-9_]+)""#).expect("static regex"));

#[derive(Debug, Clone, Serialize)]
pub struct HandoffResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subagent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmux_window_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_profile: Option<String>,
}

impl HandoffResult {
    fn failure(message: impl Into<String>, terminal_id: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: None,
            terminal_id,
            subagent_id: None,
            tmux_window_id: None,
            agent_profile: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInboxResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_id: Option<String>,
    pub messages: Vec<InboxMessage>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListWorkersResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub workers: Vec<crate::service::TerminalView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoneResult {
    pub success: bool,
    pub message: String,
}

/// The calling terminal's identity, as resolved from one of two contexts the
/// transport layer can supply: a tracked terminal id, or an agent-internal
/// session identifier (e.g. an OpenCode `sessionID`) mapped back via
/// `delegating_agent_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallerContext {
    pub tracked_terminal_id: Option<String>,
    pub session_id: Option<String>,
}

/// Downgrade an HTTP-backed provider inherited from a supervisor to its
/// local streaming equivalent, so a delegation chain never loops back
/// through the same remote server.
fn downgrade_provider(provider: ProviderKind) -> ProviderKind {
    match provider {
        ProviderKind::OpencodeApi => ProviderKind::Opencode,
        other => other,
    }
}

pub struct DelegationTools<M: MuxClient + 'static> {
    service: Arc<TerminalService<M>>,
    store: Arc<Store>,
    #[allow(dead_code)]
    registry: Arc<ProviderRegistry<M>>,
    default_provider: ProviderKind,
    enable_working_directory: bool,
    idle_wait_timeout: Duration,
    poll_interval: Duration,
    subagent_settle_delay: Duration,
}

impl<M: MuxClient + 'static> DelegationTools<M> {
    pub fn new(
        service: Arc<TerminalService<M>>,
        store: Arc<Store>,
        registry: Arc<ProviderRegistry<M>>,
        default_provider: ProviderKind,
        enable_working_directory: bool,
    ) -> Self {
        Self {
            service,
            store,
            registry,
            default_provider,
            enable_working_directory,
            idle_wait_timeout: IDLE_WAIT_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            subagent_settle_delay: SUBAGENT_SETTLE_DELAY,
        }
    }

    /// Same as `new`, with the wait/poll durations overridden — used by
    /// tests so a bounded-timeout assertion doesn't have to burn wall-clock
    /// time matching production values.
    #[cfg(test)]
    pub fn with_intervals(mut self, idle_wait_timeout: Duration, poll_interval: Duration, subagent_settle_delay: Duration) -> Self {
        self.idle_wait_timeout = idle_wait_timeout;
        self.poll_interval = poll_interval;
        self.subagent_settle_delay = subagent_settle_delay;
        self
    }

    /// Tracked terminal id always wins over a supplied session id (see
    /// Open Question iii: a deliberate simplification of overlapping,
    /// mutually-inconsistent branches in the original tool implementation).
    async fn resolve_caller(&self, ctx: &CallerContext) -> Option<Terminal> {
        if let Some(id) = &ctx.tracked_terminal_id {
            if let Some(terminal) = self.store.get_terminal(id).await {
                return Some(terminal);
            }
        }
        if let Some(session_id) = &ctx.session_id {
            if let Some(terminal) = self.store.get_terminal_by_delegating_agent(session_id).await {
                return Some(terminal);
            }
        }
        None
    }

    async fn resolve_cwd(&self, caller: Option<&Terminal>, requested: Option<String>) -> Option<String> {
        if !self.enable_working_directory {
            return None;
        }
        if requested.is_some() {
            return requested;
        }
        let caller = caller?;
        self.service.get_working_directory(&caller.id).await.ok().flatten()
    }

    fn spawn_params(
        &self,
        caller: Option<&Terminal>,
        agent_profile: &str,
        cwd: Option<String>,
        initial_message: Option<String>,
    ) -> CreateTerminalParams {
        match caller {
            Some(caller) => CreateTerminalParams {
                provider: downgrade_provider(ProviderKind::from(caller.provider)),
                agent_profile: agent_profile.to_string(),
                session_name: Some(caller.session_name.clone()),
                new_session: false,
                cwd,
                delegating_agent_id: Some(caller.id.clone()),
                target_window_name: None,
                initial_message,
            },
            None => CreateTerminalParams {
                provider: self.default_provider,
                agent_profile: agent_profile.to_string(),
                session_name: None,
                new_session: true,
                cwd,
                delegating_agent_id: None,
                target_window_name: None,
                initial_message,
            },
        }
    }

    /// Poll `terminal_id`'s live status at a fixed interval until it matches
    /// one of `targets` or `timeout` elapses. Never blocks unboundedly.
    async fn wait_until_status(&self, terminal_id: &str, targets: &[TerminalStatus], timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(view) = self.service.get_terminal(terminal_id).await {
                if targets.iter().any(|t| t.as_str() == view.status) {
                    return true;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Poll `terminal_id`'s live status at a fixed interval until it matches
    /// one of `targets` or `timeout` elapses, concurrently scanning the pane
    /// tail for the agent's internal session id and capturing it the first
    /// time it appears.
    async fn wait_until_status_capturing_session_id(
        &self,
        terminal_id: &str,
        targets: &[TerminalStatus],
        timeout: Duration,
    ) -> (bool, Option<String>) {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut subagent_id = None;
        loop {
            if subagent_id.is_none() {
                if let Ok(tail) = self.service.get_output(terminal_id, OutputMode::Tail, Some(200)).await {
                    subagent_id = SESSION_ID.captures(&tail).map(|c| c[1].to_string());
                }
            }
            if let Ok(view) = self.service.get_terminal(terminal_id).await {
                if targets.iter().any(|t| t.as_str() == view.status) {
                    return (true, subagent_id);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return (false, subagent_id);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Create a subagent terminal, wait for it to reach `IDLE`, send
    /// `message`, then poll until completion (or `timeout_secs` elapses) and
    /// return its last output. Cleans up with the provider's exit command on
    /// success.
    pub async fn handoff(
        &self,
        caller_ctx: &CallerContext,
        agent_profile: &str,
        message: &str,
        timeout_secs: u64,
        cwd: Option<String>,
    ) -> HandoffResult {
        let caller = self.resolve_caller(caller_ctx).await;
        let cwd = self.resolve_cwd(caller.as_ref(), cwd).await;
        let params = self.spawn_params(caller.as_ref(), agent_profile, cwd, Some(message.to_string()));

        let terminal = match self.service.create_terminal(params).await {
            Ok(terminal) => terminal,
            Err(e) => return HandoffResult::failure(format!("handoff failed: {e}"), None),
        };

        if !self.wait_until_status(&terminal.id, &[TerminalStatus::Idle], self.idle_wait_timeout).await {
            return HandoffResult::failure(
                format!("terminal {} did not reach IDLE status within 30 seconds", terminal.id),
                Some(terminal.id),
            );
        }

        tokio::time::sleep(self.subagent_settle_delay).await;

        if let Err(e) = self.service.send_input(&terminal.id, message).await {
            return HandoffResult::failure(format!("handoff failed: {e}"), Some(terminal.id));
        }

        let timeout = Duration::from_secs(timeout_secs);
        let (reached, subagent_id) = self
            .wait_until_status_capturing_session_id(
                &terminal.id,
                &[TerminalStatus::Completed, TerminalStatus::Error],
                timeout,
            )
            .await;
        if !reached {
            return HandoffResult {
                success: false,
                message: format!("handoff timed out after {timeout_secs} seconds"),
                output: None,
                terminal_id: Some(terminal.id),
                subagent_id,
                tmux_window_id: Some(terminal.name),
                agent_profile: Some(terminal.agent_profile),
            };
        }

        let output = match self.service.get_output(&terminal.id, OutputMode::Last, None).await {
            Ok(output) => output,
            Err(e) => {
                return HandoffResult {
                    success: false,
                    message: format!("failed to extract output: {e}"),
                    output: None,
                    terminal_id: Some(terminal.id),
                    subagent_id,
                    tmux_window_id: Some(terminal.name),
                    agent_profile: Some(terminal.agent_profile),
                }
            }
        };

        if let Err(e) = self.service.send_exit(&terminal.id).await {
            tracing::warn!(terminal_id = %terminal.id, error = %e, "failed to send exit command after handoff");
        }

        HandoffResult {
            success: true,
            message: format!("successfully handed off to {agent_profile}"),
            output: Some(output),
            terminal_id: Some(terminal.id),
            subagent_id,
            tmux_window_id: Some(terminal.name),
            agent_profile: Some(terminal.agent_profile),
        }
    }

    /// Create a subagent terminal and send the message immediately, without
    /// waiting for `IDLE` first. The Delivery Scheduler's auto-relay is
    /// solely responsible for surfacing the eventual result.
    pub async fn assign(
        &self,
        caller_ctx: &CallerContext,
        agent_profile: &str,
        message: &str,
        cwd: Option<String>,
    ) -> HandoffResult {
        let caller = self.resolve_caller(caller_ctx).await;
        let cwd = self.resolve_cwd(caller.as_ref(), cwd).await;
        let params = self.spawn_params(caller.as_ref(), agent_profile, cwd, Some(message.to_string()));

        let terminal = match self.service.create_terminal(params).await {
            Ok(terminal) => terminal,
            Err(e) => return HandoffResult::failure(format!("assignment failed: {e}"), None),
        };

        if let Err(e) = self.service.send_input(&terminal.id, message).await {
            return HandoffResult::failure(format!("assignment failed: {e}"), Some(terminal.id));
        }

        HandoffResult {
            success: true,
            message: format!("task assigned to {agent_profile} (terminal: {})", terminal.id),
            output: None,
            terminal_id: Some(terminal.id),
            subagent_id: None,
            tmux_window_id: Some(terminal.name),
            agent_profile: Some(terminal.agent_profile),
        }
    }

    /// Resolve the sender's identity per the usual precedence and enqueue an
    /// inbox message for `receiver_id`.
    pub async fn send_message(&self, caller_ctx: &CallerContext, receiver_id: &str, message: &str) -> SendMessageResult {
        let sender = self.resolve_caller(caller_ctx).await.map(|t| t.id);
        let Some(sender_id) = sender else {
            return SendMessageResult {
                success: false,
                error: Some("sender identity not found (no tracked terminal and no explicit sender)".to_string()),
                message_id: None,
            };
        };

        let created = self.store.create_inbox_message(Some(sender_id), receiver_id.to_string(), message.to_string()).await;
        SendMessageResult { success: true, error: None, message_id: Some(created.id) }
    }

    /// List messages for `terminal_id`, or the tracked terminal's own inbox
    /// if `terminal_id` is omitted.
    pub async fn check_inbox(&self, caller_ctx: &CallerContext, terminal_id: Option<&str>, limit: usize) -> CheckInboxResult {
        let target = terminal_id.map(str::to_string).or_else(|| caller_ctx.tracked_terminal_id.clone());
        let Some(target_id) = target else {
            return CheckInboxResult {
                success: false,
                error: Some("no terminal_id provided and no tracked terminal id available".to_string()),
                terminal_id: None,
                messages: Vec::new(),
                count: 0,
            };
        };

        let messages = self.store.list_inbox_messages(&target_id, None, limit).await;
        let count = messages.len();
        CheckInboxResult { success: true, error: None, terminal_id: Some(target_id), messages, count }
    }

    /// List workers in `session_id`, or the tracked terminal's own session if
    /// `session_id` is omitted.
    pub async fn list_workers(&self, caller_ctx: &CallerContext, session_id: Option<&str>) -> ListWorkersResult {
        let session_name = match session_id {
            Some(id) => Some(id.to_string()),
            None => match &caller_ctx.tracked_terminal_id {
                Some(tracked) => self.store.get_terminal(tracked).await.map(|t| t.session_name),
                None => None,
            },
        };

        let Some(session_name) = session_name else {
            return ListWorkersResult {
                success: false,
                error: Some("could not determine session_id for worker discovery".to_string()),
                workers: Vec::new(),
            };
        };

        ListWorkersResult { success: true, error: None, workers: self.service.list_workers(&session_name).await }
    }

    /// Resolve the caller's supervisor (`delegating_agent_id`) and send it
    /// `message` as direct input, so a subagent can explicitly hand control
    /// back before exiting.
    pub async fn done(&self, caller_ctx: &CallerContext, message: &str) -> DoneResult {
        let Some(tracked) = &caller_ctx.tracked_terminal_id else {
            return DoneResult {
                success: false,
                message: "no tracked terminal id set; this terminal is not being tracked".to_string(),
            };
        };

        let Some(terminal) = self.store.get_terminal(tracked).await else {
            return DoneResult { success: false, message: format!("terminal '{tracked}' not found") };
        };

        let Some(supervisor_id) = terminal.delegating_agent_id else {
            return DoneResult {
                success: false,
                message: "could not identify a supervisor terminal to relay results to".to_string(),
            };
        };

        match self.service.send_input(&supervisor_id, message).await {
            Ok(()) => DoneResult {
                success: true,
                message: format!("results successfully relayed to supervisor terminal {supervisor_id}"),
            },
            Err(e) => DoneResult { success: false, message: format!("failed to relay results: {e}") },
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
