// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The axum HTTP surface: one thin handler module per concern, all sharing
//! `State<Arc<AppState<M>>>` and calling the same `TerminalService`/`Store`
//! functions the stdio tool loop calls.

mod health;
mod inbox;
mod sessions;
mod terminals;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::mux::MuxClient;
use crate::transport::state::AppState;

/// Build the axum `Router` with every route in the HTTP surface.
pub fn build_router<M: MuxClient + 'static>(state: Arc<AppState<M>>) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins_list());

    Router::new()
        .route("/sessions", post(terminals::create_session::<M>))
        .route("/sessions/{session}/terminals", post(terminals::create_terminal_in_session::<M>))
        .route("/sessions/{session}/workers", get(sessions::list_workers::<M>))
        .route("/terminals/by-delegating-agent/{id}", get(terminals::get_by_delegating_agent::<M>))
        .route("/terminals/{id}", get(terminals::get_terminal::<M>).delete(terminals::delete_terminal::<M>))
        .route("/terminals/{id}/working-directory", get(terminals::get_working_directory::<M>))
        .route("/terminals/{id}/input", post(terminals::send_input::<M>))
        .route("/terminals/{id}/output", get(terminals::get_output::<M>))
        .route("/terminals/{id}/exit", post(terminals::send_exit::<M>))
        .route(
            "/terminals/{id}/inbox/messages",
            get(inbox::list_messages::<M>).post(inbox::enqueue_message::<M>),
        )
        .route("/healthz", get(health::healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if parsed.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new().allow_origin(parsed).allow_methods(tower_http::cors::Any).allow_headers(tower_http::cors::Any)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
