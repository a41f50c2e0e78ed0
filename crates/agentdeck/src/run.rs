// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level server bootstrap — shared by `main` and integration tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::mux::TmuxClient;
use crate::profile::ProfileStore;
use crate::provider::ProviderRegistry;
use crate::scheduler::DeliveryScheduler;
use crate::service::TerminalService;
use crate::store::Store;
use crate::tools::DelegationTools;
use crate::transport::{self, AppState};

/// Initialize tracing/logging from config. Uses `try_init` so it's safe to
/// call more than once (e.g. from tests).
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// Build every collaborator and serve both transports until `shutdown` is
/// cancelled or a termination signal arrives.
pub async fn run(config: Config) -> anyhow::Result<()> {
    init_tracing(&config);
    let config = Arc::new(config);

    let state_dir = config.state_dir_resolved();
    std::fs::create_dir_all(&state_dir)?;
    let log_dir = state_dir.join("pane-logs");
    std::fs::create_dir_all(&log_dir)?;

    let store = Arc::new(Store::open(&state_dir));
    let mux = Arc::new(TmuxClient::new());
    let profiles = Arc::new(ProfileStore::load_dir(&state_dir.join("profiles")));
    let registry = Arc::new(ProviderRegistry::new(mux.clone(), profiles.clone(), config.opencode_api_url.clone()));
    let service = Arc::new(TerminalService::new(store.clone(), mux.clone(), registry.clone(), profiles.clone(), log_dir.clone()));
    let default_provider = config.default_provider_enum()?;
    let tools = Arc::new(DelegationTools::new(
        service.clone(),
        store.clone(),
        registry.clone(),
        default_provider,
        config.enable_working_directory,
    ));

    let shutdown = CancellationToken::new();

    let scheduler = Arc::new(DeliveryScheduler::new(
        store.clone(),
        service.clone(),
        registry.clone(),
        log_dir,
        config.inbox_tail_lines,
        Duration::from_secs(config.inbox_poll_interval_secs),
    ));
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown.clone()));

    let tool_loop_handle = match config.tool_transport.as_str() {
        "stdio" => Some(tokio::spawn(transport::mcp::run_stdio_loop(tools.clone()))),
        _ => {
            info!(transport = %config.tool_transport, "tool transport not served over stdio, skipping stdio loop");
            None
        }
    };

    let state = Arc::new(AppState::new(store, service, tools, registry, config.clone()));
    let router = transport::http::build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    let shutdown_for_serve = shutdown.clone();
    axum::serve(listener, router).with_graceful_shutdown(async move { shutdown_for_serve.cancelled().await }).await?;

    shutdown.cancel();
    scheduler_handle.abort();
    if let Some(handle) = tool_loop_handle {
        handle.abort();
    }

    Ok(())
}
