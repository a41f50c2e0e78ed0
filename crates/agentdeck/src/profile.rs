// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent profiles: a named system prompt + MCP server configuration passed
//! to a provider at launch. Resolving a profile name against a search path
//! on disk is an external collaborator's job; this module only carries the
//! minimal shape the Claude provider needs plus a trivial JSON-file lookup.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<serde_json::Value>,
}

impl AgentProfile {
    pub fn unnamed(name: impl Into<String>) -> Self {
        Self { name: name.into(), system_prompt: None, mcp_servers: None }
    }
}

/// A minimal in-memory profile store, optionally seeded from a directory of
/// `<name>.json` files.
#[derive(Default)]
pub struct ProfileStore {
    profiles: HashMap<String, AgentProfile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir` as a profile, keyed by file stem.
    /// Missing directories are not an error — profile loading is best-effort.
    pub fn load_dir(dir: &Path) -> Self {
        let mut profiles = HashMap::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if let Ok(contents) = std::fs::read_to_string(&path) {
                    if let Ok(mut profile) = serde_json::from_str::<AgentProfile>(&contents) {
                        profile.name = stem.to_string();
                        profiles.insert(stem.to_string(), profile);
                    }
                }
            }
        }
        Self { profiles }
    }

    pub fn get(&self, name: &str) -> Option<&AgentProfile> {
        self.profiles.get(name)
    }

    /// Resolve a profile by name, falling back to an unnamed profile with no
    /// system prompt or MCP servers when the name isn't registered — an agent
    /// profile is advisory, not a hard requirement to create a terminal.
    pub fn resolve(&self, name: &str) -> AgentProfile {
        self.get(name).cloned().unwrap_or_else(|| AgentProfile::unnamed(name))
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
