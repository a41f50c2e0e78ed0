// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The delivery scheduler: watches the per-terminal pane-log directory and,
//! on every modification, runs auto-relay before checking the inbox.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::mux::MuxClient;
use crate::provider::ProviderRegistry;
use crate::service::{OutputMode, TerminalService};
use crate::store::terminal::TerminalStatus;
use crate::store::{MessageStatus, Store};

/// `(terminal_id, initial_message)` — keys the auto-relay dedup set so a
/// terminal reused for a second task relays again.
type RelayKey = (String, Option<String>);

pub struct DeliveryScheduler<M: MuxClient> {
    store: Arc<Store>,
    service: Arc<TerminalService<M>>,
    registry: Arc<ProviderRegistry<M>>,
    log_dir: PathBuf,
    inbox_tail_lines: usize,
    poll_interval: Duration,
    relayed: Mutex<HashSet<RelayKey>>,
}

impl<M: MuxClient + 'static> DeliveryScheduler<M> {
    pub fn new(
        store: Arc<Store>,
        service: Arc<TerminalService<M>>,
        registry: Arc<ProviderRegistry<M>>,
        log_dir: PathBuf,
        inbox_tail_lines: usize,
        poll_interval: Duration,
    ) -> Self {
        Self { store, service, registry, log_dir, inbox_tail_lines, poll_interval, relayed: Mutex::new(HashSet::new()) }
    }

    /// Run until `shutdown` is cancelled. Reacts to `notify` events on the
    /// log directory, with a polling fallback in case events are missed or
    /// unsupported on the host filesystem.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let (wake_tx, mut wake_rx) = mpsc::channel::<PathBuf>(64);
        let _watcher = self.setup_notify_watcher(wake_tx.clone());

        let mut poll_interval = tokio::time::interval(self.poll_interval);
        poll_interval.tick().await;

        loop {
            let changed: Option<PathBuf> = tokio::select! {
                _ = shutdown.cancelled() => break,
                path = wake_rx.recv() => path,
                _ = poll_interval.tick() => None,
            };

            match changed {
                Some(path) => {
                    if let Some(terminal_id) = terminal_id_from_log_path(&path) {
                        self.handle_log_change(&terminal_id).await;
                    }
                }
                None => self.poll_all_terminals().await,
            }
        }
    }

    fn setup_notify_watcher(&self, wake_tx: mpsc::Sender<PathBuf>) -> Option<notify::RecommendedWatcher> {
        use notify::{RecursiveMode, Watcher};

        let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
            let Ok(event) = event else { return };
            for path in event.paths {
                let _ = wake_tx.try_send(path);
            }
        })
        .ok()?;

        let _ = std::fs::create_dir_all(&self.log_dir);
        watcher.watch(&self.log_dir, RecursiveMode::NonRecursive).ok()?;
        Some(watcher)
    }

    /// Sweeps every known terminal, used as a fallback when no filesystem
    /// event arrived within `poll_interval`.
    async fn poll_all_terminals(&self) {
        let terminals = self.store.list_all_terminal_ids().await;
        for terminal_id in terminals {
            self.handle_log_change(&terminal_id).await;
        }
    }

    async fn handle_log_change(&self, terminal_id: &str) {
        self.handle_auto_relay(terminal_id).await;

        let pending = self.store.list_pending_messages(terminal_id, 1).await;
        let Some(message) = pending.into_iter().next() else { return };

        if !self.has_idle_pattern_in_log(terminal_id).await {
            return;
        }

        let Some(terminal) = self.store.get_terminal(terminal_id).await else { return };
        let provider = self.registry.get_or_create(&terminal).await;
        let status = match provider.get_status(Some(self.inbox_tail_lines)).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(terminal_id, error = %e, "failed to check status before inbox delivery");
                return;
            }
        };

        if !status.accepts_delivery() {
            return;
        }

        match self.service.send_input(terminal_id, &message.message).await {
            Ok(()) => {
                self.store.update_message_status(message.id, MessageStatus::Delivered).await;
                tracing::info!(terminal_id, message_id = message.id, "delivered pending inbox message");
            }
            Err(e) => {
                tracing::error!(terminal_id, message_id = message.id, error = %e, "failed to deliver pending inbox message");
                self.store.update_message_status(message.id, MessageStatus::Failed).await;
            }
        }
    }

    async fn handle_auto_relay(&self, terminal_id: &str) {
        let Some(terminal) = self.store.get_terminal(terminal_id).await else { return };
        let Some(supervisor_id) = terminal.delegating_agent_id.clone() else { return };

        let provider = self.registry.get_or_create(&terminal).await;
        let status = match provider.get_status(Some(self.inbox_tail_lines)).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(terminal_id, error = %e, "auto-relay status check failed");
                return;
            }
        };
        if status != TerminalStatus::Completed {
            return;
        }

        let key: RelayKey = (terminal_id.to_string(), terminal.initial_message.clone());
        if self.relayed.lock().await.contains(&key) {
            return;
        }

        let output = match self.service.get_output(terminal_id, OutputMode::Last, None).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(terminal_id, error = %e, "auto-relay failed to extract output");
                return;
            }
        };

        if output.trim().is_empty() {
            tracing::warn!(terminal_id, "terminal completed but no output extracted");
            return;
        }

        // Only mark relayed once a non-empty output is confirmed, so a
        // failed or empty extraction leaves the key unset for a later
        // completion to retry.
        if !self.relayed.lock().await.insert(key) {
            return;
        }

        let relay_message = format!("Subagent {terminal_id} results:\n\n{output}");
        if let Err(e) = self.service.send_input(&supervisor_id, &relay_message).await {
            tracing::error!(terminal_id, supervisor_id, error = %e, "auto-relay failed to send to supervisor");
        } else {
            tracing::info!(terminal_id, supervisor_id, "auto-relayed subagent results to supervisor");
        }
    }

    async fn has_idle_pattern_in_log(&self, terminal_id: &str) -> bool {
        let Some(terminal) = self.store.get_terminal(terminal_id).await else { return false };
        let tail = read_log_tail(&self.log_dir.join(format!("{terminal_id}.log")), 5);
        if tail.is_empty() {
            return false;
        }

        let provider = self.registry.get_or_create(&terminal).await;
        let Ok(pattern) = Regex::new(provider.idle_pattern_for_log()) else { return false };
        pattern.is_match(&tail)
    }
}

fn terminal_id_from_log_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("log") {
        return None;
    }
    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

fn read_log_tail(path: &Path, lines: usize) -> String {
    let Ok(contents) = std::fs::read_to_string(path) else { return String::new() };
    contents.lines().rev().take(lines).collect::<Vec<_>>().into_iter().rev().collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
