use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{parse_field, required_str, scalar_str};
use crate::ipc::types::{AppState, Request};
use crate::pipeline::Surface;
use crate::record::StudentsResponse;
use crate::view::{Alert, StatsView, StudentCard};
use serde_json::json;
use uuid::Uuid;

const LOAD_FAILED_MESSAGE: &str = "Failed to load student data";

/// Renders the current frame once and queues it for every subscriber.
pub fn publish(state: &mut AppState, reason: &str) {
    let subscribers = state.roster.subscribers();
    if subscribers.is_empty() {
        return;
    }
    let frame = state.roster.frame().to_json();
    tracing::debug!(
        reason,
        generation = state.roster.generation(),
        visible = frame["counters"]["visible"].as_u64().unwrap_or(0),
        subscribers = subscribers.len(),
        "publishing frame"
    );
    let events: Vec<serde_json::Value> = subscribers
        .iter()
        .map(|s| {
            json!({
                "event": "roster.frame",
                "subscriptionId": s.id.to_string(),
                "surface": s.surface,
                "reason": reason,
                "frame": frame,
            })
        })
        .collect();
    state.events.extend(events);
}

fn stats_json(state: &AppState) -> serde_json::Value {
    state
        .roster
        .stats()
        .map(|s| json!(StatsView::from_stats(s)))
        .unwrap_or(serde_json::Value::Null)
}

fn roster_load(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let response: StudentsResponse = parse_field(&req.params, "response")?;
    let success = response.is_success();
    let status = response.status.clone();
    state.roster.load_response(response);
    state.search_debounce.cancel();
    if success {
        tracing::info!(total = state.roster.total(), "roster loaded");
    } else {
        tracing::warn!(status = %status, "students endpoint returned no data");
    }
    publish(state, "load");
    Ok(json!({
        "status": if success && state.roster.total() > 0 { "loaded" } else { "no_data" },
        "generation": state.roster.generation(),
        "counters": state.roster.counters(),
        "stats": stats_json(state),
    }))
}

fn roster_load_failed(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let message = scalar_str(&req.params, "message")
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| LOAD_FAILED_MESSAGE.to_string());
    let status = req
        .params
        .get("status")
        .and_then(|v| v.as_u64())
        .and_then(|v| u16::try_from(v).ok())
        .unwrap_or(500);
    tracing::error!(status, message = %message, "student data fetch failed");
    state.roster.mark_load_failed();
    state.search_debounce.cancel();
    publish(state, "load_failed");
    Ok(json!({
        "alert": Alert::new(status, message),
        "frame": state.roster.frame().to_json(),
    }))
}

fn roster_visible(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    if state.search_debounce.is_pending() {
        state.search_debounce.cancel();
        publish(state, "search");
    }
    Ok(json!({ "frame": state.roster.frame().to_json() }))
}

fn roster_card(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = scalar_str(&req.params, "id")
        .ok_or_else(|| HandlerErr::bad_params("missing params.id"))?;
    let record = state.roster.find(&id).ok_or_else(|| {
        HandlerErr::new("not_found", "student not found").with_details(json!({ "id": id }))
    })?;
    Ok(json!({ "card": StudentCard::from_record(record) }))
}

fn roster_subscribe(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let surface: Surface = parse_field(&req.params, "surface")?;
    let id = state.roster.subscribe(surface);
    tracing::info!(subscription = %id, ?surface, "surface subscribed");
    Ok(json!({
        "subscriptionId": id.to_string(),
        "surface": surface,
        "frame": state.roster.frame().to_json(),
    }))
}

fn roster_unsubscribe(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let raw = required_str(&req.params, "subscriptionId")?;
    let id = Uuid::parse_str(raw)
        .map_err(|_| HandlerErr::bad_params("subscriptionId must be a uuid"))?;
    if !state.roster.unsubscribe(&id) {
        return Err(HandlerErr::new("not_found", "subscription not found")
            .with_details(json!({ "subscriptionId": raw })));
    }
    Ok(json!({ "removed": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "roster.load" => roster_load(state, req),
        "roster.loadFailed" => roster_load_failed(state, req),
        "roster.visible" => roster_visible(state),
        "roster.card" => roster_card(state, req),
        "roster.classes" => Ok(json!({ "classes": state.roster.classes() })),
        "roster.stats" => Ok(json!({ "stats": stats_json(state) })),
        "roster.subscribe" => roster_subscribe(state, req),
        "roster.unsubscribe" => roster_unsubscribe(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
