// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::config::Config;
use crate::mux::MuxClient;
use crate::provider::ProviderRegistry;
use crate::service::TerminalService;
use crate::store::Store;
use crate::tools::DelegationTools;

/// Shared application state passed to every HTTP handler and tool-loop call
/// via an `Arc`. Explicitly constructed and threaded through, never a global
/// singleton, so tests can build isolated instances.
pub struct AppState<M: MuxClient + 'static> {
    pub store: Arc<Store>,
    pub service: Arc<TerminalService<M>>,
    pub tools: Arc<DelegationTools<M>>,
    pub registry: Arc<ProviderRegistry<M>>,
    pub config: Arc<Config>,
}

impl<M: MuxClient + 'static> AppState<M> {
    pub fn new(
        store: Arc<Store>,
        service: Arc<TerminalService<M>>,
        tools: Arc<DelegationTools<M>>,
        registry: Arc<ProviderRegistry<M>>,
        config: Arc<Config>,
    ) -> Self {
        Self { store, service, tools, registry, config }
    }
}
