// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use tokio::process::Command;

use super::MuxClient;

/// Shells out to the `tmux` binary for every operation.
pub struct TmuxClient {
    history_lines: usize,
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self { history_lines: 200 }
    }
}

impl TmuxClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        let output = Command::new("tmux").args(args).output().await?;
        if !output.status.success() {
            anyhow::bail!(
                "tmux {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn target(session: &str, window: &str) -> String {
        format!("{session}:{window}")
    }
}

#[async_trait]
impl MuxClient for TmuxClient {
    async fn session_exists(&self, session: &str) -> bool {
        Command::new("tmux")
            .args(["has-session", "-t", session])
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn create_session(
        &self,
        session: &str,
        window: &str,
        terminal_id: &str,
        cwd: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut args = vec!["new-session", "-d", "-s", session, "-n", window];
        if let Some(dir) = cwd {
            args.push("-c");
            args.push(dir);
        }
        self.run(&args).await?;
        self.send_keys(session, window, &format!("export AGENTDECK_TERMINAL_ID={terminal_id}"))
            .await?;
        Ok(())
    }

    async fn create_window(
        &self,
        session: &str,
        window: &str,
        terminal_id: &str,
        cwd: Option<&str>,
    ) -> anyhow::Result<String> {
        let mut args = vec!["new-window", "-t", session, "-n", window, "-P", "-F", "#{window_name}"];
        if let Some(dir) = cwd {
            args.push("-c");
            args.push(dir);
        }
        let resolved = self.run(&args).await?.trim().to_string();
        let resolved = if resolved.is_empty() { window.to_string() } else { resolved };
        self.send_keys(session, &resolved, &format!("export AGENTDECK_TERMINAL_ID={terminal_id}"))
            .await?;
        Ok(resolved)
    }

    async fn send_keys(&self, session: &str, window: &str, text: &str) -> anyhow::Result<()> {
        let target = Self::target(session, window);
        self.run(&["send-keys", "-t", &target, text, "Enter"]).await?;
        Ok(())
    }

    async fn get_history(
        &self,
        session: &str,
        window: &str,
        tail_lines: Option<usize>,
    ) -> anyhow::Result<String> {
        let target = Self::target(session, window);
        let lines = tail_lines.unwrap_or(self.history_lines);
        let start = format!("-{lines}");
        self.run(&["capture-pane", "-t", &target, "-p", "-S", &start]).await
    }

    async fn pipe_pane(&self, session: &str, window: &str, log_path: &str) -> anyhow::Result<()> {
        let target = Self::target(session, window);
        let cmd = format!("cat >> {log_path}");
        self.run(&["pipe-pane", "-t", &target, "-o", &cmd]).await?;
        Ok(())
    }

    async fn stop_pipe_pane(&self, session: &str, window: &str) -> anyhow::Result<()> {
        let target = Self::target(session, window);
        self.run(&["pipe-pane", "-t", &target]).await?;
        Ok(())
    }

    async fn get_pane_working_directory(&self, session: &str, window: &str) -> Option<String> {
        let target = Self::target(session, window);
        let output = Command::new("tmux")
            .args(["display-message", "-t", &target, "-p", "#{pane_current_path}"])
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if path.is_empty() {
            None
        } else {
            Some(path)
        }
    }

    async fn get_session_windows(&self, session: &str) -> anyhow::Result<Vec<(u32, String)>> {
        let output = self
            .run(&["list-windows", "-t", session, "-F", "#{window_index} #{window_name}"])
            .await?;
        let mut windows = Vec::new();
        for line in output.lines() {
            let mut parts = line.splitn(2, ' ');
            let Some(idx) = parts.next().and_then(|s| s.parse::<u32>().ok()) else {
                continue;
            };
            let Some(name) = parts.next() else { continue };
            windows.push((idx, name.to_string()));
        }
        Ok(windows)
    }

    async fn kill_session(&self, session: &str) -> anyhow::Result<()> {
        self.run(&["kill-session", "-t", session]).await?;
        Ok(())
    }
}
