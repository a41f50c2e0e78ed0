// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles used across unit and integration tests in this crate.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::mux::MuxClient;

/// An in-memory fake of the multiplexer, recording calls instead of
/// shelling out to a real `tmux` binary.
#[derive(Default)]
pub struct FakeMuxClient {
    pub sessions: Mutex<HashMap<String, Vec<String>>>,
    pub killed_sessions: Mutex<Vec<String>>,
    pub histories: Mutex<HashMap<(String, String), String>>,
    pub sent_keys: Mutex<Vec<(String, String, String)>>,
    pub pane_cwds: Mutex<HashMap<(String, String), String>>,
}

impl FakeMuxClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_history(&self, session: &str, window: &str, text: &str) {
        self.histories
            .lock()
            .unwrap()
            .insert((session.to_string(), window.to_string()), text.to_string());
    }
}

#[async_trait]
impl MuxClient for FakeMuxClient {
    async fn session_exists(&self, session: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(session)
    }

    async fn create_session(
        &self,
        session: &str,
        window: &str,
        _terminal_id: &str,
        _cwd: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(session) {
            anyhow::bail!("session already exists");
        }
        sessions.insert(session.to_string(), vec![window.to_string()]);
        Ok(())
    }

    async fn create_window(
        &self,
        session: &str,
        window: &str,
        _terminal_id: &str,
        _cwd: Option<&str>,
    ) -> anyhow::Result<String> {
        let mut sessions = self.sessions.lock().unwrap();
        let Some(windows) = sessions.get_mut(session) else {
            anyhow::bail!("session not found");
        };
        windows.push(window.to_string());
        Ok(window.to_string())
    }

    async fn send_keys(&self, session: &str, window: &str, text: &str) -> anyhow::Result<()> {
        self.sent_keys
            .lock()
            .unwrap()
            .push((session.to_string(), window.to_string(), text.to_string()));
        Ok(())
    }

    async fn get_history(
        &self,
        session: &str,
        window: &str,
        _tail_lines: Option<usize>,
    ) -> anyhow::Result<String> {
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(&(session.to_string(), window.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn pipe_pane(&self, _session: &str, _window: &str, _log_path: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop_pipe_pane(&self, _session: &str, _window: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn get_pane_working_directory(&self, session: &str, window: &str) -> Option<String> {
        self.pane_cwds.lock().unwrap().get(&(session.to_string(), window.to_string())).cloned()
    }

    async fn get_session_windows(&self, session: &str) -> anyhow::Result<Vec<(u32, String)>> {
        let sessions = self.sessions.lock().unwrap();
        let Some(windows) = sessions.get(session) else {
            anyhow::bail!("session not found");
        };
        Ok(windows.iter().enumerate().map(|(i, w)| (i as u32, w.clone())).collect())
    }

    async fn kill_session(&self, session: &str) -> anyhow::Result<()> {
        self.sessions.lock().unwrap().remove(session);
        self.killed_sessions.lock().unwrap().push(session.to_string());
        Ok(())
    }
}
