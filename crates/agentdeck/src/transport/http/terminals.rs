// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal and session lifecycle HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::ProviderKind;
use crate::error::{ErrorCode, ServiceError};
use crate::mux::MuxClient;
use crate::service::{CreateTerminalParams, OutputMode, TerminalView};
use crate::transport::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTerminalRequest {
    pub provider: Option<String>,
    #[serde(default = "default_agent_profile")]
    pub agent_profile: String,
    pub session_name: Option<String>,
    pub cwd: Option<String>,
    pub delegating_agent_id: Option<String>,
    pub initial_message: Option<String>,
}

fn default_agent_profile() -> String {
    "default".to_string()
}

fn resolve_provider<M: MuxClient + 'static>(
    state: &AppState<M>,
    requested: Option<&str>,
) -> Result<ProviderKind, ServiceError> {
    match requested {
        Some(name) => ProviderKind::parse(name).map_err(|e| ServiceError::new(ErrorCode::InvalidArgument, e.to_string())),
        None => state
            .config
            .default_provider_enum()
            .map_err(|e| ServiceError::new(ErrorCode::InvalidArgument, e.to_string())),
    }
}

async fn create_terminal_and_view<M: MuxClient + 'static>(
    state: &AppState<M>,
    params: CreateTerminalParams,
) -> Result<TerminalView, ServiceError> {
    let terminal = state.service.create_terminal(params).await?;
    state.service.get_terminal(&terminal.id).await
}

/// `POST /sessions` — create a new tmux session and its first terminal.
pub async fn create_session<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Json(req): Json<CreateTerminalRequest>,
) -> impl IntoResponse {
    let provider = match resolve_provider(&state, req.provider.as_deref()) {
        Ok(p) => p,
        Err(e) => return e.to_http_response().into_response(),
    };

    let params = CreateTerminalParams {
        provider,
        agent_profile: req.agent_profile,
        session_name: req.session_name,
        new_session: true,
        cwd: req.cwd,
        delegating_agent_id: req.delegating_agent_id,
        target_window_name: None,
        initial_message: req.initial_message,
    };

    match create_terminal_and_view(&state, params).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `POST /sessions/{session}/terminals` — add a terminal to an existing session.
pub async fn create_terminal_in_session<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(session): Path<String>,
    Json(req): Json<CreateTerminalRequest>,
) -> impl IntoResponse {
    let provider = match resolve_provider(&state, req.provider.as_deref()) {
        Ok(p) => p,
        Err(e) => return e.to_http_response().into_response(),
    };

    let params = CreateTerminalParams {
        provider,
        agent_profile: req.agent_profile,
        session_name: Some(session),
        new_session: false,
        cwd: req.cwd,
        delegating_agent_id: req.delegating_agent_id,
        target_window_name: None,
        initial_message: req.initial_message,
    };

    match create_terminal_and_view(&state, params).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `GET /terminals/{id}`
pub async fn get_terminal<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.service.get_terminal(&id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `GET /terminals/by-delegating-agent/{id}`
pub async fn get_by_delegating_agent<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Some(terminal) = state.store.get_terminal_by_delegating_agent(&id).await else {
        return ServiceError::new(ErrorCode::NotFound, format!("no terminal delegating to '{id}'"))
            .to_http_response()
            .into_response();
    };

    match state.service.get_terminal(&terminal.id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct WorkingDirectoryResponse {
    pub cwd: Option<String>,
}

/// `GET /terminals/{id}/working-directory`
pub async fn get_working_directory<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.service.get_working_directory(&id).await {
        Ok(cwd) => Json(WorkingDirectoryResponse { cwd }).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub message: String,
}

/// `POST /terminals/{id}/input`
pub async fn send_input<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(id): Path<String>,
    Json(req): Json<InputRequest>,
) -> impl IntoResponse {
    match state.service.send_input(&id, &req.message).await {
        Ok(()) => Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputQuery {
    #[serde(default = "default_mode")]
    pub mode: String,
    pub tail_lines: Option<usize>,
}

fn default_mode() -> String {
    "full".to_string()
}

#[derive(Debug, Serialize)]
pub struct OutputResponse {
    pub output: String,
}

/// `GET /terminals/{id}/output?mode=full|last|tail&tail_lines=N`
pub async fn get_output<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(id): Path<String>,
    Query(query): Query<OutputQuery>,
) -> impl IntoResponse {
    let mode = match query.mode.as_str() {
        "full" => OutputMode::Full,
        "last" => OutputMode::Last,
        "tail" => OutputMode::Tail,
        other => {
            return ServiceError::new(ErrorCode::InvalidArgument, format!("invalid output mode: {other}"))
                .to_http_response()
                .into_response();
        }
    };

    match state.service.get_output(&id, mode, query.tail_lines).await {
        Ok(output) => Json(OutputResponse { output }).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `DELETE /terminals/{id}`
pub async fn delete_terminal<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.service.delete_terminal(&id).await {
        Ok(deleted) => Json(serde_json::json!({ "deleted": deleted })).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `POST /terminals/{id}/exit`
pub async fn send_exit<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.service.send_exit(&id).await {
        Ok(()) => Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

#[cfg(test)]
#[path = "terminals_tests.rs"]
mod tests;
