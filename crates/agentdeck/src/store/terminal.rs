// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::config::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalStatus {
    Idle,
    Processing,
    Completed,
    WaitingUserAnswer,
    Error,
}

impl TerminalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::WaitingUserAnswer => "WAITING_USER_ANSWER",
            Self::Error => "ERROR",
        }
    }

    /// A terminal is ready to receive the next inbox message when it's
    /// either sitting idle or has just finished producing output.
    pub fn accepts_delivery(&self) -> bool {
        matches!(self, Self::Idle | Self::Completed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    pub id: String,
    pub name: String,
    pub provider: ProviderKindWire,
    pub session_name: String,
    pub agent_profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegating_agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
    pub last_active_ms: u64,
}

/// A serializable mirror of [`ProviderKind`] — kept separate so the store's
/// wire format doesn't depend on `ProviderKind` gaining non-serde derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKindWire {
    Claude,
    Opencode,
    OpencodeApi,
    OpencodeAttach,
}

impl From<ProviderKind> for ProviderKindWire {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Claude => Self::Claude,
            ProviderKind::Opencode => Self::Opencode,
            ProviderKind::OpencodeApi => Self::OpencodeApi,
            ProviderKind::OpencodeAttach => Self::OpencodeAttach,
        }
    }
}

impl From<ProviderKindWire> for ProviderKind {
    fn from(kind: ProviderKindWire) -> Self {
        match kind {
            ProviderKindWire::Claude => Self::Claude,
            ProviderKindWire::Opencode => Self::Opencode,
            ProviderKindWire::OpencodeApi => Self::OpencodeApi,
            ProviderKindWire::OpencodeAttach => Self::OpencodeAttach,
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
