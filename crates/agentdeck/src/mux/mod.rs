// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The multiplexer client: a thin async wrapper over the real `tmux` binary.

mod tmux;

pub use tmux::TmuxClient;

use async_trait::async_trait;

/// One tmux window's address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRef {
    pub session: String,
    pub window: String,
}

/// Operations against a terminal multiplexer, implemented by shelling out to
/// the real `tmux` binary — no tmux-control crate exists to wrap instead.
#[async_trait]
pub trait MuxClient: Send + Sync {
    async fn session_exists(&self, session: &str) -> bool;

    async fn create_session(
        &self,
        session: &str,
        window: &str,
        terminal_id: &str,
        cwd: Option<&str>,
    ) -> anyhow::Result<()>;

    /// Returns the resolved window name (tmux may rename it on collision).
    async fn create_window(
        &self,
        session: &str,
        window: &str,
        terminal_id: &str,
        cwd: Option<&str>,
    ) -> anyhow::Result<String>;

    async fn send_keys(&self, session: &str, window: &str, text: &str) -> anyhow::Result<()>;

    async fn get_history(
        &self,
        session: &str,
        window: &str,
        tail_lines: Option<usize>,
    ) -> anyhow::Result<String>;

    async fn pipe_pane(&self, session: &str, window: &str, log_path: &str) -> anyhow::Result<()>;

    async fn stop_pipe_pane(&self, session: &str, window: &str) -> anyhow::Result<()>;

    /// Never raises: returns `None` on any failure to query or parse the
    /// pane's working directory.
    async fn get_pane_working_directory(&self, session: &str, window: &str) -> Option<String>;

    async fn get_session_windows(&self, session: &str) -> anyhow::Result<Vec<(u32, String)>>;

    async fn kill_session(&self, session: &str) -> anyhow::Result<()>;
}

/// Resolve and validate a working directory parameter: `None` resolves to
/// the realpath of the current process's cwd; a provided path is
/// canonicalized and rejected if it doesn't name an existing directory.
pub fn resolve_working_directory(cwd: Option<&str>) -> anyhow::Result<std::path::PathBuf> {
    let path = match cwd {
        Some(p) => std::path::PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    let resolved = path
        .canonicalize()
        .map_err(|_| anyhow::anyhow!("working directory does not exist: {}", path.display()))?;
    if !resolved.is_dir() {
        anyhow::bail!("working directory does not exist: {}", resolved.display());
    }
    Ok(resolved)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
