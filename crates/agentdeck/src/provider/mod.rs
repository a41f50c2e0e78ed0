// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider state machines: one implementation per agent CLI flavor, each
//! responsible for turning raw tmux pane text (or, for the HTTP-backed
//! flavors, a remote API) into a [`TerminalStatus`] and for extracting the
//! final assistant message out of a completed turn.

pub mod claude;
pub mod opencode;
pub mod opencode_api;
pub mod opencode_attach;
pub mod registry;

pub use registry::ProviderRegistry;

use async_trait::async_trait;

use crate::store::terminal::TerminalStatus;

/// Shared identity a provider needs to address its own tmux window or
/// remote session.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub terminal_id: String,
    pub session_name: String,
    pub window_name: String,
    pub agent_profile: String,
}

/// One state machine per `ProviderKind`. Implementations must not block the
/// async runtime — tmux calls go through [`crate::mux::MuxClient`], HTTP
/// calls through `reqwest`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Launch the agent CLI (or, for HTTP-backed providers, verify the
    /// remote endpoint is reachable).
    async fn initialize(&self) -> anyhow::Result<()>;

    /// Deliver a message to the running agent.
    async fn send_input(&self, message: &str) -> anyhow::Result<()>;

    /// Classify the terminal's current state from its last `tail_lines` of
    /// pane history (or all history if `None`).
    async fn get_status(&self, tail_lines: Option<usize>) -> anyhow::Result<TerminalStatus>;

    /// Pull the agent's final response out of a completed turn's output.
    /// The HTTP-backed providers ignore `script_output` and fetch the
    /// message from their remote session instead.
    async fn extract_last_message(&self, script_output: &str) -> anyhow::Result<String>;

    /// A regex checked cheaply against a short log tail before paying for a
    /// full [`Provider::get_status`] re-check.
    fn idle_pattern_for_log(&self) -> &str;

    /// Keystrokes (or command) that cleanly exit the agent CLI.
    fn exit_command(&self) -> &str;

    /// Release any resources the provider holds beyond the tmux pane itself
    /// (e.g. an HTTP-backed provider's remote session). Called once by
    /// [`ProviderRegistry::remove`] before the provider is dropped from the
    /// registry; must be safe to call more than once.
    async fn cleanup(&self) -> anyhow::Result<()>;
}
