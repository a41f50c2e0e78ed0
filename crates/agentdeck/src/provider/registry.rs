// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::claude::ClaudeProvider;
use super::opencode::OpencodeProvider;
use super::opencode_api::OpencodeApiProvider;
use super::opencode_attach::OpencodeAttachProvider;
use super::{Provider, ProviderContext};
use crate::config::ProviderKind;
use crate::mux::MuxClient;
use crate::profile::ProfileStore;
use crate::store::terminal::Terminal;

/// Maps a terminal id to its live provider, constructing one lazily from
/// persisted terminal metadata the first time it's needed and caching it
/// thereafter. Never global or ambient — always held by `AppState` and
/// passed down.
pub struct ProviderRegistry<M: MuxClient> {
    mux: Arc<M>,
    profiles: Arc<ProfileStore>,
    opencode_api_url: String,
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
}

impl<M: MuxClient + 'static> ProviderRegistry<M> {
    pub fn new(mux: Arc<M>, profiles: Arc<ProfileStore>, opencode_api_url: String) -> Self {
        Self { mux, profiles, opencode_api_url, providers: RwLock::new(HashMap::new()) }
    }

    /// Fetch the cached provider for `terminal`, constructing and caching
    /// one if this is the first time it's needed since process start.
    pub async fn get_or_create(&self, terminal: &Terminal) -> Arc<dyn Provider> {
        if let Some(provider) = self.providers.read().await.get(&terminal.id) {
            return provider.clone();
        }

        let mut providers = self.providers.write().await;
        if let Some(provider) = providers.get(&terminal.id) {
            return provider.clone();
        }

        let provider = self.build(terminal);
        providers.insert(terminal.id.clone(), provider.clone());
        provider
    }

    /// Replace the cached provider for `terminal_id`, used when a handoff
    /// downgrades an HTTP-backed provider to its local equivalent.
    pub async fn replace(&self, terminal: &Terminal) -> Arc<dyn Provider> {
        let provider = self.build(terminal);
        self.providers.write().await.insert(terminal.id.clone(), provider.clone());
        provider
    }

    pub async fn remove(&self, terminal_id: &str) {
        let provider = self.providers.write().await.remove(terminal_id);
        if let Some(provider) = provider {
            if let Err(e) = provider.cleanup().await {
                tracing::warn!(terminal_id, error = %e, "provider cleanup failed");
            }
        }
    }

    fn build(&self, terminal: &Terminal) -> Arc<dyn Provider> {
        let ctx = ProviderContext {
            terminal_id: terminal.id.clone(),
            session_name: terminal.session_name.clone(),
            window_name: terminal.name.clone(),
            agent_profile: terminal.agent_profile.clone(),
        };

        match ProviderKind::from(terminal.provider) {
            ProviderKind::Claude => {
                Arc::new(ClaudeProvider::new(ctx, self.mux.clone(), self.profiles.clone()))
            }
            ProviderKind::Opencode => Arc::new(OpencodeProvider::new(ctx, self.mux.clone())),
            ProviderKind::OpencodeApi => {
                Arc::new(OpencodeApiProvider::new(ctx, self.opencode_api_url.clone()))
            }
            ProviderKind::OpencodeAttach => {
                Arc::new(OpencodeAttachProvider::new(ctx, self.mux.clone()))
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
