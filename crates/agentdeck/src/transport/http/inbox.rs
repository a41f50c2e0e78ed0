// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ServiceError};
use crate::mux::MuxClient;
use crate::store::{InboxMessage, MessageStatus};
use crate::transport::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<InboxMessage>,
    pub count: usize,
}

/// `GET /terminals/{id}/inbox/messages?status=&limit=`
pub async fn list_messages<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if limit > MAX_LIMIT {
        return ServiceError::new(ErrorCode::InvalidArgument, format!("limit must be at most {MAX_LIMIT}"))
            .to_http_response()
            .into_response();
    }

    let status = match query.status.as_deref() {
        Some(s) => match MessageStatus::parse(s) {
            Ok(status) => Some(status),
            Err(e) => {
                return ServiceError::new(ErrorCode::InvalidArgument, e.to_string()).to_http_response().into_response();
            }
        },
        None => None,
    };

    let messages = state.store.list_inbox_messages(&id, status, limit).await;
    let count = messages.len();
    Json(ListMessagesResponse { messages, count }).into_response()
}

#[derive(Debug, Deserialize)]
pub struct EnqueueMessageQuery {
    pub sender_id: Option<String>,
    pub message: String,
}

/// `POST /terminals/{id}/inbox/messages?sender_id=&message=`
pub async fn enqueue_message<M: MuxClient + 'static>(
    State(state): State<Arc<AppState<M>>>,
    Path(id): Path<String>,
    Query(query): Query<EnqueueMessageQuery>,
) -> impl IntoResponse {
    let created = state.store.create_inbox_message(query.sender_id, id, query.message).await;
    Json(created)
}

#[cfg(test)]
#[path = "inbox_tests.rs"]
mod tests;
