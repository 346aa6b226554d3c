use std::time::Instant;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::roster::publish;
use crate::ipc::helpers::parse_field;
use crate::ipc::types::{AppState, Request};
use crate::pipeline::ControlsPatch;
use serde_json::json;

fn controls_result(state: &AppState, changed: bool) -> serde_json::Value {
    json!({
        "controls": state.roster.controls().to_json(),
        "changed": changed,
        "pending": state.search_debounce.is_pending(),
        "counters": state.roster.counters(),
    })
}

fn controls_set(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let patch: ControlsPatch = parse_field(&req.params, "patch")?;
    let debounce = req
        .params
        .get("debounce")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    let search_only = patch.is_search_only();

    let changed = state
        .roster
        .update_controls(patch)
        .map_err(HandlerErr::bad_params)?;

    if search_only && debounce {
        if changed {
            state.search_debounce.schedule(Instant::now());
        }
    } else if changed || state.search_debounce.is_pending() {
        // a non-search change supersedes the deferred search publish
        state.search_debounce.cancel();
        publish(state, "controls");
    }
    Ok(controls_result(state, changed))
}

fn controls_clear(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let changed = state.roster.clear_controls();
    state.search_debounce.cancel();
    if changed {
        publish(state, "clear");
    }
    Ok(controls_result(state, changed))
}

fn controls_toggle_sort_dir(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let direction = state.roster.toggle_sort_direction();
    state.search_debounce.cancel();
    publish(state, "sort");
    tracing::debug!(?direction, "sort direction toggled");
    Ok(controls_result(state, true))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "controls.get" => Ok(controls_result(state, false)),
        "controls.set" => controls_set(state, req),
        "controls.clear" => controls_clear(state),
        "controls.toggleSortDir" => controls_toggle_sort_dir(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
