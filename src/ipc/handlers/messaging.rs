use chrono::Utc;
use serde_json::json;

use crate::config;
use crate::db::SettingsLimitStore;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{parse_field, scalar_str};
use crate::ipc::types::{AppState, Request};
use crate::messaging::{self, ComposedMessage, LinkTarget};
use crate::ratelimit::{LimitState, LimitStore, RateLimiter, Rejection};

/// `ComposedMessage` from `params.response`, or bare `phone`/`message`.
fn composed(req: &Request) -> Result<(String, String), HandlerErr> {
    if req.params.get("response").is_some() {
        let c: ComposedMessage = parse_field(&req.params, "response")?;
        let phone = c.phone_text();
        let message = c
            .message
            .ok_or_else(|| HandlerErr::bad_params("missing response.watsapp_message"))?;
        return Ok((phone, message));
    }
    let phone = scalar_str(&req.params, "phone")
        .ok_or_else(|| HandlerErr::bad_params("missing params.phone"))?;
    let message = scalar_str(&req.params, "message")
        .ok_or_else(|| HandlerErr::bad_params("missing params.message"))?;
    Ok((phone, message))
}

fn link_target(req: &Request) -> Result<LinkTarget, HandlerErr> {
    if req.params.get("target").is_some() {
        return parse_field(&req.params, "target");
    }
    Ok(scalar_str(&req.params, "userAgent")
        .map(|ua| LinkTarget::from_user_agent(&ua))
        .unwrap_or(LinkTarget::Web))
}

fn with_store<T>(
    state: &AppState,
    f: impl FnOnce(&dyn LimitStore) -> anyhow::Result<T>,
) -> Result<T, HandlerErr> {
    let result = match state.db.as_ref() {
        Some(conn) => f(&SettingsLimitStore { conn }),
        None => f(&state.limiter_memory),
    };
    result.map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))
}

fn rejection_err(r: Rejection) -> HandlerErr {
    let message = r.message();
    let details = match r {
        Rejection::Wait { seconds } => json!({ "reason": "wait", "seconds": seconds }),
        Rejection::DailyCap { cap } => json!({ "reason": "daily_cap", "cap": cap }),
    };
    HandlerErr::new("rate_limited", message).with_details(details)
}

fn messaging_send(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let (raw_phone, message) = composed(req)?;
    let target = link_target(req)?;
    let phone = messaging::normalize_phone(&raw_phone)
        .map_err(|e| HandlerErr::new("invalid_phone", e.message()))?;

    let policy = config::rate_limit_policy(state.db.as_ref());
    let granted: Result<LimitState, Rejection> = with_store(state, |store| {
        RateLimiter::new(store, policy).try_acquire(Utc::now(), &mut rand::thread_rng())
    })?;
    let sent = match granted {
        Ok(s) => s,
        Err(r) => {
            tracing::warn!(rejection = ?r, "whatsapp send rate limited");
            return Err(rejection_err(r));
        }
    };

    Ok(json!({
        "url": messaging::whatsapp_link(&phone, &message, target),
        "target": target,
        "phone": phone,
        "sentToday": sent.count,
    }))
}

fn messaging_status(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let policy = config::rate_limit_policy(state.db.as_ref());
    let current = with_store(state, |store| RateLimiter::new(store, policy).status(Utc::now()))?;
    Ok(json!({
        "state": current,
        "policy": policy,
        "remainingToday": policy.daily_cap.saturating_sub(current.count),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "messaging.send" => messaging_send(state, req),
        "messaging.status" => messaging_status(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
