// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed append-only write-ahead log, generic over a serializable
//! record type.
//!
//! Records are appended as JSONL. Replay reads the whole file back in and
//! deserializes each line — no in-memory buffer, no truncation. This is the
//! durability primitive the metadata store's terminals/inbox/flows tables
//! are all built on.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// An append-only JSONL log of `T` records.
///
/// If constructed with `path: None` (used by tests), nothing is written and
/// `replay` always returns empty — useful for in-memory-only store tests.
pub struct EventLog<T> {
    path: Option<PathBuf>,
    _marker: std::marker::PhantomData<T>,
}

impl<T> EventLog<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: Option<PathBuf>) -> Self {
        if let Some(ref p) = path {
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        Self { path, _marker: std::marker::PhantomData }
    }

    pub fn at(path: &Path) -> Self {
        Self::new(Some(path.to_path_buf()))
    }

    /// Append one record. Best-effort: a write failure is swallowed rather
    /// than propagated, matching this log's "never blocks the caller on a
    /// durability hiccup" posture — callers keep their in-memory state as
    /// the source of truth within a process lifetime.
    pub fn append(&self, record: &T) {
        let Some(ref path) = self.path else {
            return;
        };
        let Ok(mut line) = serde_json::to_string(record) else {
            return;
        };
        line.push('\n');
        let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };
        let _ = file.write_all(line.as_bytes());
    }

    /// Replay every record in file order.
    pub fn replay(&self) -> Vec<T> {
        let Some(ref path) = self.path else {
            return vec![];
        };
        let Ok(contents) = std::fs::read_to_string(path) else {
            return vec![];
        };
        contents
            .lines()
            .filter_map(|line| serde_json::from_str::<T>(line).ok())
            .collect()
    }
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
