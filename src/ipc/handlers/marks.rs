use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::parse;
use crate::ipc::types::{AppState, Request};
use crate::marks::{self, MarkEntry, MarksResponse};
use serde_json::json;

fn marks_prepare(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let entry: MarkEntry = parse(&req.params, "params")?;
    let payload = marks::prepare(entry).map_err(|r| {
        HandlerErr::new("validation_failed", r.message).with_details(json!({ "field": "score" }))
    })?;
    Ok(json!({ "payload": payload }))
}

fn marks_outcome(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let resp: MarksResponse = parse(&req.params, "params")?;
    let outcome = marks::outcome(&resp);
    if !outcome.saved {
        tracing::warn!(status = resp.http_status, "marks update rejected by backend");
    }
    Ok(json!(outcome))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "marks.prepare" => marks_prepare(req),
        "marks.outcome" => marks_outcome(req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
