use std::time::Instant;

use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    tracing::debug!(id = %req.id, method = %req.method, "request");

    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::roster::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::controls::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::marks::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::forms::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::messaging::try_handle(state, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}

/// When the next debounced publish is due, if any.
pub fn pending_deadline(state: &AppState) -> Option<Instant> {
    state.search_debounce.deadline()
}

/// Publishes the debounced frame once its deadline has passed.
pub fn flush_due(state: &mut AppState, now: Instant) -> bool {
    if state.search_debounce.fire_if_due(now) {
        handlers::roster::publish(state, "search");
        true
    } else {
        false
    }
}
