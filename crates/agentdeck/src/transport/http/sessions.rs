// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-scoped HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::mux::MuxClient;
use crate::transport::state::AppState;

/// `GET /sessions/{session}/workers`
pub async fn list_workers<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(session): Path<String>,
) -> impl IntoResponse {
    Json(state.service.list_workers(&session).await)
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
