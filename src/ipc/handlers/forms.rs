use crate::forms::{self, ErrorStage, FieldError, RollSuggestion};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{parse_field, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Map, Value};

fn forms_prepare(req: &Request) -> Result<Value, HandlerErr> {
    let fields: Map<String, Value> = parse_field(&req.params, "fields")?;
    Ok(json!({ "payload": forms::normalize_payload(fields) }))
}

fn forms_errors(req: &Request) -> Result<Value, HandlerErr> {
    let stage: ErrorStage = parse_field(&req.params, "stage")?;
    let errors: Vec<FieldError> = parse_field(&req.params, "errors")?;
    Ok(json!(forms::error_view(stage, &errors)))
}

fn forms_roll_hint(req: &Request) -> Result<Value, HandlerErr> {
    let suggestion: RollSuggestion = parse_field(&req.params, "response")?;
    Ok(json!({
        "hint": forms::roll_hint(&suggestion),
        "nextRoll": suggestion.next_roll,
    }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "forms.prepare" => forms_prepare(req),
        "forms.errors" => forms_errors(req),
        "forms.formatAadhaar" => required_str(&req.params, "value")
            .map(|v| json!({ "value": forms::format_aadhaar(v) })),
        "forms.maskDate" => required_str(&req.params, "value")
            .map(|v| json!({ "value": forms::mask_date(v) })),
        "forms.rollHint" => forms_roll_hint(req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
