use serde::de::DeserializeOwned;

use crate::ipc::error::HandlerErr;

pub fn required_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing params.{key}")))
}

/// Strings pass through; numbers are rendered (phones and ids often
/// arrive as integers).
pub fn scalar_str(params: &serde_json::Value, key: &str) -> Option<String> {
    match params.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse<T: DeserializeOwned>(value: &serde_json::Value, what: &str) -> Result<T, HandlerErr> {
    serde_json::from_value(value.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid {what}: {e}")))
}

pub fn parse_field<T: DeserializeOwned>(params: &serde_json::Value, key: &str) -> Result<T, HandlerErr> {
    let Some(v) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing params.{key}")));
    };
    parse(v, &format!("params.{key}"))
}
