// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Id and name generation for terminals, sessions and tmux windows.

use uuid::Uuid;

fn hex_prefix(len: usize) -> String {
    Uuid::new_v4().simple().to_string()[..len].to_string()
}

/// An 8 lowercase hex character terminal id, matching the `^[a-f0-9]{8}$`
/// format this system has always used.
pub fn generate_terminal_id() -> String {
    hex_prefix(8)
}

/// A tmux session name, same shape as a terminal id.
pub fn generate_session_name() -> String {
    hex_prefix(8)
}

/// A tmux window name derived from an agent profile, `{profile}-{4 hex}`.
pub fn generate_window_name(agent_profile: &str) -> String {
    format!("{agent_profile}-{}", hex_prefix(4))
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
