use crate::view::Alert;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One entry of the backend's `{field, message}[]` error payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldError {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStage {
    /// `/api/pydantic_verification`
    Verification,
    /// `/api/add_student`, `/api/update_student`
    Submission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormErrorView {
    pub inline: Vec<InlineError>,
    pub focus: Option<String>,
    pub summary: Vec<String>,
    pub show_summary: bool,
    pub alerts: Vec<Alert>,
}

pub fn error_view(stage: ErrorStage, errors: &[FieldError]) -> FormErrorView {
    let inline: Vec<InlineError> = errors
        .iter()
        .filter_map(|e| {
            e.field
                .as_deref()
                .filter(|f| !f.is_empty())
                .map(|f| InlineError {
                    field: f.to_string(),
                    message: e.message.clone(),
                })
        })
        .collect();

    match stage {
        ErrorStage::Verification => FormErrorView {
            focus: errors.first().and_then(|e| e.field.clone()),
            inline,
            ..Default::default()
        },
        ErrorStage::Submission => FormErrorView {
            summary: errors.iter().map(|e| e.message.clone()).collect(),
            show_summary: true,
            alerts: errors
                .iter()
                .map(|e| {
                    let message = if e.message.is_empty() {
                        "Conflict found"
                    } else {
                        e.message.as_str()
                    };
                    Alert::new(400, message)
                })
                .collect(),
            focus: None,
            inline,
        },
    }
}

/// Form fields arrive as strings; `is_RTE` is the one boolean the
/// verification endpoint expects typed.
pub fn normalize_payload(mut fields: Map<String, Value>) -> Map<String, Value> {
    let rte = fields.get("is_RTE").and_then(|v| v.as_str()) == Some("true")
        || fields.get("is_RTE").and_then(|v| v.as_bool()) == Some(true);
    fields.insert("is_RTE".to_string(), json!(rte));
    fields
}

/// `123412341234` -> `1234-1234-1234`. Longer input is left as bare digits.
pub fn format_aadhaar(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > 12 {
        return digits;
    }
    digits
        .as_bytes()
        .chunks(4)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}

/// Progressive `DD-MM-YYYY` mask over at most eight digits.
pub fn mask_date(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(8)
        .collect();
    match digits.len() {
        n if n >= 5 => format!("{}-{}-{}", &digits[..2], &digits[2..4], &digits[4..]),
        n if n >= 3 => format!("{}-{}", &digits[..2], &digits[2..]),
        _ => digits,
    }
}

/// Body of `POST /get_new_roll_api`.
#[derive(Debug, Clone, Deserialize)]
pub struct RollSuggestion {
    pub next_roll: Value,
    #[serde(default)]
    pub gapped_rolls: Vec<Value>,
}

fn scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn roll_hint(s: &RollSuggestion) -> String {
    let rolls: Vec<String> = s
        .gapped_rolls
        .iter()
        .chain(std::iter::once(&s.next_roll))
        .map(scalar)
        .collect();
    format!("Available rolls: {}", rolls.join(", "))
}
