// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The metadata store: in-memory tables over an append-only write-ahead log
//! per table, replayed at startup. No SQL engine is involved — persistence
//! is crash-safe, not fully transactional, by design.

pub mod flow;
pub mod inbox;
pub mod terminal;

pub use flow::Flow;
pub use inbox::{InboxMessage, MessageStatus};
pub use terminal::Terminal;

use std::path::Path;

use tokio::sync::RwLock;

use crate::event_log::EventLog;

/// A record appended to a table's write-ahead log. `Delete` records a
/// tombstone rather than rewriting the log in place.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op")]
enum WalRecord<T> {
    Put(T),
    Delete { key: String },
}

pub struct Store {
    terminals: RwLock<std::collections::HashMap<String, Terminal>>,
    terminals_log: EventLog<WalRecord<Terminal>>,
    inbox: RwLock<Vec<InboxMessage>>,
    inbox_log: EventLog<WalRecord<InboxMessage>>,
    inbox_next_id: std::sync::atomic::AtomicI64,
    flows: RwLock<std::collections::HashMap<String, Flow>>,
    flows_log: EventLog<WalRecord<Flow>>,
}

impl Store {
    /// Build a store backed by write-ahead logs under `state_dir`, replaying
    /// any existing records.
    pub fn open(state_dir: &Path) -> Self {
        let terminals_log = EventLog::at(&state_dir.join("terminals.jsonl"));
        let inbox_log = EventLog::at(&state_dir.join("inbox.jsonl"));
        let flows_log = EventLog::at(&state_dir.join("flows.jsonl"));

        let mut terminals = std::collections::HashMap::new();
        for record in terminals_log.replay() {
            match record {
                WalRecord::Put(t) => {
                    terminals.insert(t.id.clone(), t);
                }
                WalRecord::Delete { key } => {
                    terminals.remove(&key);
                }
            }
        }

        let mut inbox_by_id = std::collections::HashMap::new();
        let mut max_id = 0i64;
        for record in inbox_log.replay() {
            match record {
                WalRecord::Put(m) => {
                    max_id = max_id.max(m.id);
                    inbox_by_id.insert(m.id, m);
                }
                WalRecord::Delete { key } => {
                    if let Ok(id) = key.parse::<i64>() {
                        inbox_by_id.remove(&id);
                    }
                }
            }
        }
        let mut inbox: Vec<InboxMessage> = inbox_by_id.into_values().collect();
        inbox.sort_by_key(|m| m.id);

        let mut flows = std::collections::HashMap::new();
        for record in flows_log.replay() {
            match record {
                WalRecord::Put(f) => {
                    flows.insert(f.name.clone(), f);
                }
                WalRecord::Delete { key } => {
                    flows.remove(&key);
                }
            }
        }

        Self {
            terminals: RwLock::new(terminals),
            terminals_log,
            inbox: RwLock::new(inbox),
            inbox_log,
            inbox_next_id: std::sync::atomic::AtomicI64::new(max_id + 1),
            flows: RwLock::new(flows),
            flows_log,
        }
    }

    /// An in-memory-only store with no on-disk durability, for tests.
    pub fn in_memory() -> Self {
        Self {
            terminals: RwLock::new(std::collections::HashMap::new()),
            terminals_log: EventLog::new(None),
            inbox: RwLock::new(Vec::new()),
            inbox_log: EventLog::new(None),
            inbox_next_id: std::sync::atomic::AtomicI64::new(1),
            flows: RwLock::new(std::collections::HashMap::new()),
            flows_log: EventLog::new(None),
        }
    }
}

impl Store {
    // --- terminals ---

    pub async fn create_terminal(&self, terminal: Terminal) {
        self.terminals_log.append(&WalRecord::Put(terminal.clone()));
        self.terminals.write().await.insert(terminal.id.clone(), terminal);
    }

    pub async fn get_terminal(&self, id: &str) -> Option<Terminal> {
        self.terminals.read().await.get(id).cloned()
    }

    pub async fn get_terminal_by_delegating_agent(&self, delegating_agent_id: &str) -> Option<Terminal> {
        self.terminals
            .read()
            .await
            .values()
            .find(|t| t.delegating_agent_id.as_deref() == Some(delegating_agent_id))
            .cloned()
    }

    pub async fn list_terminals_by_session(&self, session_name: &str) -> Vec<Terminal> {
        self.terminals.read().await.values().filter(|t| t.session_name == session_name).cloned().collect()
    }

    /// All known terminal ids, used by the delivery scheduler's polling
    /// fallback to sweep every terminal regardless of session.
    pub async fn list_all_terminal_ids(&self) -> Vec<String> {
        self.terminals.read().await.keys().cloned().collect()
    }

    pub async fn update_terminal_last_active(&self, id: &str) -> bool {
        let mut terminals = self.terminals.write().await;
        let Some(terminal) = terminals.get_mut(id) else {
            return false;
        };
        terminal.last_active_ms = terminal::now_ms();
        self.terminals_log.append(&WalRecord::Put(terminal.clone()));
        true
    }

    pub async fn delete_terminal(&self, id: &str) -> bool {
        let removed = self.terminals.write().await.remove(id).is_some();
        if removed {
            self.terminals_log.append(&WalRecord::Delete { key: id.to_string() });
        }
        removed
    }

    pub async fn delete_terminals_by_session(&self, session_name: &str) {
        let mut terminals = self.terminals.write().await;
        let ids: Vec<String> =
            terminals.values().filter(|t| t.session_name == session_name).map(|t| t.id.clone()).collect();
        for id in ids {
            terminals.remove(&id);
            self.terminals_log.append(&WalRecord::Delete { key: id });
        }
    }

    // --- inbox ---

    pub async fn create_inbox_message(&self, sender_id: Option<String>, receiver_id: String, message: String) -> InboxMessage {
        let id = self.inbox_next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let record = InboxMessage {
            id,
            sender_id,
            receiver_id,
            message,
            status: MessageStatus::Pending,
            created_at_ms: terminal::now_ms(),
        };
        self.inbox_log.append(&WalRecord::Put(record.clone()));
        self.inbox.write().await.push(record.clone());
        record
    }

    /// Oldest-first pending messages for `receiver_id`, capped at `limit`.
    pub async fn list_pending_messages(&self, receiver_id: &str, limit: usize) -> Vec<InboxMessage> {
        self.inbox
            .read()
            .await
            .iter()
            .filter(|m| m.receiver_id == receiver_id && m.status == MessageStatus::Pending)
            .take(limit)
            .cloned()
            .collect()
    }

    /// All messages for `receiver_id`, oldest first, optionally filtered by
    /// status and capped at `limit`.
    pub async fn list_inbox_messages(
        &self,
        receiver_id: &str,
        status: Option<MessageStatus>,
        limit: usize,
    ) -> Vec<InboxMessage> {
        self.inbox
            .read()
            .await
            .iter()
            .filter(|m| m.receiver_id == receiver_id)
            .filter(|m| status.map_or(true, |s| m.status == s))
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn update_message_status(&self, id: i64, status: MessageStatus) {
        let mut inbox = self.inbox.write().await;
        if let Some(message) = inbox.iter_mut().find(|m| m.id == id) {
            message.status = status;
            self.inbox_log.append(&WalRecord::Put(message.clone()));
        }
    }

    // --- flows ---

    pub async fn create_flow(&self, flow: Flow) {
        self.flows_log.append(&WalRecord::Put(flow.clone()));
        self.flows.write().await.insert(flow.name.clone(), flow);
    }

    pub async fn get_flow(&self, name: &str) -> Option<Flow> {
        self.flows.read().await.get(name).cloned()
    }

    pub async fn list_flows(&self) -> Vec<Flow> {
        self.flows.read().await.values().cloned().collect()
    }

    pub async fn update_flow(&self, flow: Flow) {
        self.flows_log.append(&WalRecord::Put(flow.clone()));
        self.flows.write().await.insert(flow.name.clone(), flow);
    }

    pub async fn delete_flow(&self, name: &str) -> bool {
        let removed = self.flows.write().await.remove(name).is_some();
        if removed {
            self.flows_log.append(&WalRecord::Delete { key: name.to_string() });
        }
        removed
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
