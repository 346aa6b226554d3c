use crate::config::{self, RateLimitOverride, WRITABLE_SETTINGS};
use crate::db;
use crate::ipc::error::{err, ok, respond, HandlerErr};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "loaded": state.roster.is_loaded(),
            "total": state.roster.total(),
            "subscribers": state.roster.subscribers().len(),
            "searchDebounceMs": state.search_debounce.delay().as_millis() as u64,
            "logFilter": state.config.log_filter,
        }),
    )
}

/// Opens (or creates) the workspace database; shared by the IPC method and
/// the `ROSTERD_WORKSPACE` startup path.
pub fn select_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let conn = db::open_db(path)?;
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    tracing::info!(workspace = %path.display(), "workspace opened");
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, &path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => {
            tracing::error!(error = ?e, "workspace open failed");
            err(&req.id, "db_open_failed", format!("{e:?}"), None)
        }
    }
}

fn settings_get(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let key = required_str(&req.params, "key")?;
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let value = db::settings_get_json(conn, key)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    Ok(json!({ "key": key, "value": value }))
}

fn settings_set(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let key = required_str(&req.params, "key")?;
    if !WRITABLE_SETTINGS.contains(&key) {
        return Err(HandlerErr::bad_params(format!("setting is not writable: {key}"))
            .with_details(json!({ "writable": WRITABLE_SETTINGS })));
    }
    let Some(value) = req.params.get("value") else {
        return Err(HandlerErr::bad_params("missing params.value"));
    };
    if key == config::RATE_LIMIT_SETTING {
        let o: RateLimitOverride = serde_json::from_value(value.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid {key}: {e}")))?;
        o.validate().map_err(HandlerErr::bad_params)?;
    }
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    db::settings_set_json(conn, key, value)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    tracing::info!(key, "setting updated");
    Ok(json!({ "key": key, "value": value }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "settings.get" => Some(respond(&req.id, settings_get(state, req))),
        "settings.set" => Some(respond(&req.id, settings_set(state, req))),
        _ => None,
    }
}
