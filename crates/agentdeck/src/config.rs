// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;

/// Terminal worker orchestrator for AI coding agents.
#[derive(Debug, Parser)]
#[command(name = "agentdeck", version, about)]
pub struct Config {
    /// HTTP port to listen on.
    #[arg(long, env = "AGENTDECK_PORT", default_value = "9889")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "AGENTDECK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Public base URL this server is reachable at, used by tools that need
    /// to address it from inside a terminal's own environment.
    #[arg(long, env = "AGENTDECK_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Directory for the metadata write-ahead logs and pane-output logs.
    #[arg(long, env = "AGENTDECK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Provider used when a terminal is created without one specified.
    #[arg(long, env = "AGENTDECK_DEFAULT_PROVIDER", default_value = "opencode")]
    pub default_provider: String,

    /// Comma-separated list of allowed CORS origins.
    #[arg(
        long,
        env = "AGENTDECK_CORS_ORIGINS",
        default_value = "http://localhost:3000,http://127.0.0.1:3000"
    )]
    pub cors_origins: String,

    /// Allow delegation tools to accept a `cwd` parameter.
    #[arg(long, env = "AGENTDECK_ENABLE_WORKING_DIRECTORY", default_value = "false")]
    pub enable_working_directory: bool,

    /// Transport for the delegation-tool surface.
    #[arg(long, env = "AGENTDECK_TOOL_TRANSPORT", default_value = "stdio")]
    pub tool_transport: String,

    /// Log format (json or text).
    #[arg(long, env = "AGENTDECK_LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "AGENTDECK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Delivery scheduler polling interval, in seconds, for the cheap
    /// idle-pattern pre-check between filesystem events.
    #[arg(long, env = "AGENTDECK_INBOX_POLL_INTERVAL", default_value = "5")]
    pub inbox_poll_interval_secs: u64,

    /// Tail length, in lines, read when checking a provider's idle pattern
    /// before paying for an authoritative status query.
    #[arg(long, env = "AGENTDECK_INBOX_TAIL_LINES", default_value = "5")]
    pub inbox_tail_lines: usize,

    /// Base URL of the `opencode` HTTP server used by the `opencode-api`
    /// provider.
    #[arg(long, env = "AGENTDECK_OPENCODE_API_URL", default_value = "http://opencode:3000")]
    pub opencode_api_url: String,
}

/// Known provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    Opencode,
    OpencodeApi,
    OpencodeAttach,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Opencode => "opencode",
            Self::OpencodeApi => "opencode-api",
            Self::OpencodeAttach => "opencode-attach",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "claude" => Ok(Self::Claude),
            "opencode" => Ok(Self::Opencode),
            "opencode-api" => Ok(Self::OpencodeApi),
            "opencode-attach" => Ok(Self::OpencodeAttach),
            other => anyhow::bail!("invalid provider: {other}"),
        }
    }
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        ProviderKind::parse(&self.default_provider)?;

        match self.tool_transport.as_str() {
            "stdio" | "sse" | "http" => {}
            other => anyhow::bail!("invalid tool transport: {other}"),
        }

        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }

        if self.inbox_tail_lines == 0 {
            anyhow::bail!("--inbox-tail-lines must be at least 1");
        }

        Ok(())
    }

    /// Resolve the configured default provider into its enum form.
    pub fn default_provider_enum(&self) -> anyhow::Result<ProviderKind> {
        ProviderKind::parse(&self.default_provider)
    }

    /// Parse the configured CORS origins into a list.
    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Resolve the state directory, defaulting to a well-known location under
    /// the user's state home.
    pub fn state_dir_resolved(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(default_state_dir)
    }
}

fn default_state_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("agentdeck");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/agentdeck");
    }
    PathBuf::from(".agentdeck")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
