// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The terminal service: the workflow layer sitting between the HTTP/MCP
//! transports and the Store + MuxClient + Provider Registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::ProviderKind;
use crate::error::{ErrorCode, ServiceError};
use crate::ids::{generate_session_name, generate_terminal_id, generate_window_name};
use crate::mux::{resolve_working_directory, MuxClient};
use crate::profile::ProfileStore;
use crate::provider::ProviderRegistry;
use crate::store::terminal::{now_ms, ProviderKindWire, TerminalStatus};
use crate::store::{Store, Terminal};

/// Which form of a terminal's output to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Full,
    Last,
    Tail,
}

/// Terminal metadata merged with a live status query, the shape returned to
/// callers.
#[derive(Debug, Clone, Serialize)]
pub struct TerminalView {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub session_name: String,
    pub agent_profile: String,
    pub delegating_agent_id: Option<String>,
    pub initial_message: Option<String>,
    pub status: String,
    pub last_active_ms: u64,
}

fn view(terminal: &Terminal, status: TerminalStatus) -> TerminalView {
    TerminalView {
        id: terminal.id.clone(),
        name: terminal.name.clone(),
        provider: terminal.provider.as_str().to_string(),
        session_name: terminal.session_name.clone(),
        agent_profile: terminal.agent_profile.clone(),
        delegating_agent_id: terminal.delegating_agent_id.clone(),
        initial_message: terminal.initial_message.clone(),
        status: status.as_str().to_string(),
        last_active_ms: terminal.last_active_ms,
    }
}

#[derive(Debug)]
pub struct CreateTerminalParams {
    pub provider: ProviderKind,
    pub agent_profile: String,
    pub session_name: Option<String>,
    pub new_session: bool,
    pub cwd: Option<String>,
    pub delegating_agent_id: Option<String>,
    pub target_window_name: Option<String>,
    pub initial_message: Option<String>,
}

pub struct TerminalService<M: MuxClient> {
    store: Arc<Store>,
    mux: Arc<M>,
    registry: Arc<ProviderRegistry<M>>,
    #[allow(dead_code)]
    profiles: Arc<ProfileStore>,
    log_dir: PathBuf,
}

impl<M: MuxClient + 'static> TerminalService<M> {
    pub fn new(
        store: Arc<Store>,
        mux: Arc<M>,
        registry: Arc<ProviderRegistry<M>>,
        profiles: Arc<ProfileStore>,
        log_dir: PathBuf,
    ) -> Self {
        Self { store, mux, registry, profiles, log_dir }
    }

    fn log_path(&self, terminal_id: &str) -> PathBuf {
        self.log_dir.join(format!("{terminal_id}.log"))
    }

    pub async fn create_terminal(&self, params: CreateTerminalParams) -> Result<Terminal, ServiceError> {
        let terminal_id = generate_terminal_id();
        let session_name = params.session_name.unwrap_or_else(generate_session_name);
        let mut window_name =
            params.target_window_name.unwrap_or_else(|| generate_window_name(&params.agent_profile));

        let result = self
            .create_terminal_inner(
                &terminal_id,
                &session_name,
                &mut window_name,
                &params.agent_profile,
                params.provider,
                params.new_session,
                params.cwd.as_deref(),
                params.delegating_agent_id.clone(),
                params.initial_message.clone(),
            )
            .await;

        if result.is_err() && params.new_session {
            let _ = self.mux.kill_session(&session_name).await;
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_terminal_inner(
        &self,
        terminal_id: &str,
        session_name: &str,
        window_name: &mut String,
        agent_profile: &str,
        provider: ProviderKind,
        new_session: bool,
        cwd: Option<&str>,
        delegating_agent_id: Option<String>,
        initial_message: Option<String>,
    ) -> Result<Terminal, ServiceError> {
        let resolved_cwd = resolve_working_directory(cwd)
            .map_err(|e| ServiceError::new(ErrorCode::InvalidArgument, e.to_string()))?;
        let resolved_cwd = resolved_cwd.to_string_lossy().into_owned();

        if new_session {
            if self.mux.session_exists(session_name).await {
                return Err(ServiceError::new(ErrorCode::Conflict, format!("session '{session_name}' already exists")));
            }
            self.mux
                .create_session(session_name, window_name, terminal_id, Some(&resolved_cwd))
                .await
                .map_err(|e| ServiceError::new(ErrorCode::MuxError, e.to_string()))?;
        } else {
            if !self.mux.session_exists(session_name).await {
                return Err(ServiceError::new(ErrorCode::NotFound, format!("session '{session_name}' not found")));
            }
            *window_name = self
                .mux
                .create_window(session_name, window_name, terminal_id, Some(&resolved_cwd))
                .await
                .map_err(|e| ServiceError::new(ErrorCode::MuxError, e.to_string()))?;
        }

        let terminal = Terminal {
            id: terminal_id.to_string(),
            name: window_name.clone(),
            provider: ProviderKindWire::from(provider),
            session_name: session_name.to_string(),
            agent_profile: agent_profile.to_string(),
            delegating_agent_id,
            initial_message,
            last_active_ms: now_ms(),
        };
        self.store.create_terminal(terminal.clone()).await;

        let provider_instance = self.registry.get_or_create(&terminal).await;
        provider_instance.initialize().await.map_err(|e| ServiceError::new(ErrorCode::ProviderError, e.to_string()))?;

        let log_path = self.log_path(terminal_id);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::OpenOptions::new().create(true).append(true).open(&log_path);
        self.mux
            .pipe_pane(session_name, window_name, &log_path.to_string_lossy())
            .await
            .map_err(|e| ServiceError::new(ErrorCode::MuxError, e.to_string()))?;

        Ok(terminal)
    }

    async fn live_status(&self, terminal: &Terminal) -> anyhow::Result<TerminalStatus> {
        let provider = self.registry.get_or_create(terminal).await;
        provider.get_status(None).await
    }

    pub async fn get_terminal(&self, terminal_id: &str) -> Result<TerminalView, ServiceError> {
        let terminal = self
            .store
            .get_terminal(terminal_id)
            .await
            .ok_or_else(|| ServiceError::new(ErrorCode::NotFound, format!("terminal '{terminal_id}' not found")))?;

        let status = self.live_status(&terminal).await.map_err(|e| ServiceError::new(ErrorCode::ProviderError, e.to_string()))?;
        Ok(view(&terminal, status))
    }

    pub async fn list_workers(&self, session_name: &str) -> Vec<TerminalView> {
        let terminals = self.store.list_terminals_by_session(session_name).await;
        let mut workers = Vec::with_capacity(terminals.len());
        for terminal in terminals {
            let status = match self.live_status(&terminal).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(terminal_id = %terminal.id, error = %e, "failed to get live status; downgrading to IDLE");
                    TerminalStatus::Idle
                }
            };
            workers.push(view(&terminal, status));
        }
        workers
    }

    pub async fn get_working_directory(&self, terminal_id: &str) -> Result<Option<String>, ServiceError> {
        let terminal = self
            .store
            .get_terminal(terminal_id)
            .await
            .ok_or_else(|| ServiceError::new(ErrorCode::NotFound, format!("terminal '{terminal_id}' not found")))?;

        Ok(self.mux.get_pane_working_directory(&terminal.session_name, &terminal.name).await)
    }

    pub async fn send_input(&self, terminal_id: &str, message: &str) -> Result<(), ServiceError> {
        let terminal = self
            .store
            .get_terminal(terminal_id)
            .await
            .ok_or_else(|| ServiceError::new(ErrorCode::NotFound, format!("terminal '{terminal_id}' not found")))?;

        let provider = self.registry.get_or_create(&terminal).await;
        provider.send_input(message).await.map_err(|e| ServiceError::new(ErrorCode::ProviderError, e.to_string()))?;
        self.store.update_terminal_last_active(terminal_id).await;
        tracing::info!(terminal_id, "sent input to terminal");
        Ok(())
    }

    pub async fn get_output(
        &self,
        terminal_id: &str,
        mode: OutputMode,
        tail_lines: Option<usize>,
    ) -> Result<String, ServiceError> {
        let terminal = self
            .store
            .get_terminal(terminal_id)
            .await
            .ok_or_else(|| ServiceError::new(ErrorCode::NotFound, format!("terminal '{terminal_id}' not found")))?;

        let full_output = self
            .mux
            .get_history(&terminal.session_name, &terminal.name, tail_lines)
            .await
            .map_err(|e| ServiceError::new(ErrorCode::MuxError, e.to_string()))?;

        match mode {
            OutputMode::Full | OutputMode::Tail => Ok(full_output),
            OutputMode::Last => {
                let provider = self.registry.get_or_create(&terminal).await;
                provider
                    .extract_last_message(&full_output)
                    .await
                    .map_err(|e| ServiceError::new(ErrorCode::ProviderError, e.to_string()))
            }
        }
    }

    /// Send the provider's exit command as raw keystrokes, bypassing
    /// `Provider::send_input`'s message-wrapping (e.g. opencode's heredoc
    /// launch). A provider with no exit command (the HTTP-backed and
    /// attach-only providers) makes this a no-op.
    pub async fn send_exit(&self, terminal_id: &str) -> Result<(), ServiceError> {
        let terminal = self
            .store
            .get_terminal(terminal_id)
            .await
            .ok_or_else(|| ServiceError::new(ErrorCode::NotFound, format!("terminal '{terminal_id}' not found")))?;

        let provider = self.registry.get_or_create(&terminal).await;
        let exit_command = provider.exit_command();
        if exit_command.is_empty() {
            return Ok(());
        }

        self.mux
            .send_keys(&terminal.session_name, &terminal.name, exit_command)
            .await
            .map_err(|e| ServiceError::new(ErrorCode::MuxError, e.to_string()))
    }

    pub async fn delete_terminal(&self, terminal_id: &str) -> Result<bool, ServiceError> {
        if let Some(terminal) = self.store.get_terminal(terminal_id).await {
            if let Err(e) = self.mux.stop_pipe_pane(&terminal.session_name, &terminal.name).await {
                tracing::warn!(terminal_id, error = %e, "failed to stop pipe-pane");
            }
        }

        self.registry.remove(terminal_id).await;
        let deleted = self.store.delete_terminal(terminal_id).await;
        tracing::info!(terminal_id, deleted, "deleted terminal");
        Ok(deleted)
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
