use crate::view::Alert;
use serde::{Deserialize, Serialize};
use serde_json::json;

const GRADES: [&str; 7] = ["A", "B", "C", "D", "E", "F", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationType {
    Grading,
    Numeric,
    #[serde(other)]
    Other,
}

/// One marks cell as the entry table holds it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkEntry {
    #[serde(default)]
    pub marks_id: Option<String>,
    #[serde(default)]
    pub score: String,
    pub evaluation_type: EvaluationType,
    pub student_id: serde_json::Value,
    pub subject_id: serde_json::Value,
    pub exam_id: serde_json::Value,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Body for `POST /update_marks_api`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarksPayload {
    pub marks_id: Option<String>,
    pub score: serde_json::Value,
    pub student_id: serde_json::Value,
    pub subject_id: serde_json::Value,
    pub exam_id: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRejected {
    pub message: String,
}

fn rejected(message: impl Into<String>) -> MarkRejected {
    MarkRejected {
        message: message.into(),
    }
}

/// Renders a bound without a trailing ".0".
fn bound(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

pub fn prepare(entry: MarkEntry) -> Result<MarksPayload, MarkRejected> {
    let marks_id = entry
        .marks_id
        .filter(|id| !id.is_empty() && id != "None");

    let score = match entry.evaluation_type {
        EvaluationType::Grading => {
            if !GRADES.contains(&entry.score.as_str()) {
                return Err(rejected(
                    "Invalid grade! Please enter A, B, C, D, E, or F.",
                ));
            }
            json!(entry.score)
        }
        EvaluationType::Numeric => {
            let raw = entry.score.trim();
            if raw.is_empty() {
                serde_json::Value::Null
            } else {
                let num: f64 = raw
                    .parse()
                    .ok()
                    .filter(|n: &f64| n.is_finite())
                    .ok_or_else(|| rejected("Please enter a valid number."))?;
                // Zero or absent bounds fall back to the 0..=100 default.
                let min = entry.min.filter(|m| *m != 0.0).unwrap_or(0.0);
                let max = entry.max.filter(|m| *m != 0.0).unwrap_or(100.0);
                if num < min || num > max {
                    return Err(rejected(format!(
                        "Score must be between {} and {}.",
                        bound(min),
                        bound(max)
                    )));
                }
                json!(num)
            }
        }
        EvaluationType::Other => json!(entry.score),
    };

    Ok(MarksPayload {
        marks_id,
        score,
        student_id: entry.student_id,
        subject_id: entry.subject_id,
        exam_id: entry.exam_id,
    })
}

/// Response of `POST /update_marks_api` as handed back by the host.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksResponse {
    pub http_status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksOutcome {
    pub saved: bool,
    pub new_mark_id: Option<String>,
    pub alert: Option<Alert>,
}

pub fn outcome(resp: &MarksResponse) -> MarksOutcome {
    let ok = (200..300).contains(&resp.http_status);
    let new_mark_id = resp.body.get("new_mark_id").and_then(|v| match v {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let alert = (!ok).then(|| {
        let message = resp
            .body
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or("Failed to update marks.");
        Alert::new(resp.http_status, message)
    });
    MarksOutcome {
        saved: ok,
        new_mark_id,
        alert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: EvaluationType, score: &str) -> MarkEntry {
        MarkEntry {
            marks_id: Some("None".into()),
            score: score.into(),
            evaluation_type: kind,
            student_id: json!(11),
            subject_id: json!(3),
            exam_id: json!(2),
            min: None,
            max: None,
        }
    }

    #[test]
    fn grading_accepts_letters_and_blank() {
        let p = prepare(entry(EvaluationType::Grading, "B")).expect("grade");
        assert_eq!(p.score, json!("B"));
        assert_eq!(p.marks_id, None);
        assert!(prepare(entry(EvaluationType::Grading, "")).is_ok());
        let err = prepare(entry(EvaluationType::Grading, "b")).expect_err("lowercase");
        assert_eq!(err.message, "Invalid grade! Please enter A, B, C, D, E, or F.");
    }

    #[test]
    fn numeric_blank_becomes_null() {
        let p = prepare(entry(EvaluationType::Numeric, "  ")).expect("blank");
        assert_eq!(p.score, serde_json::Value::Null);
    }

    #[test]
    fn numeric_range_uses_defaults_and_bounds() {
        let err = prepare(entry(EvaluationType::Numeric, "101")).expect_err("over");
        assert_eq!(err.message, "Score must be between 0 and 100.");

        let mut e = entry(EvaluationType::Numeric, "45.5");
        e.max = Some(50.0);
        e.marks_id = Some("m-9".into());
        let p = prepare(e).expect("in range");
        assert_eq!(p.score, json!(45.5));
        assert_eq!(p.marks_id.as_deref(), Some("m-9"));

        let mut e = entry(EvaluationType::Numeric, "2");
        e.min = Some(2.5);
        e.max = Some(0.0);
        let err = prepare(e).expect_err("under");
        assert_eq!(err.message, "Score must be between 2.5 and 100.");
    }

    #[test]
    fn numeric_rejects_garbage() {
        for bad in ["abc", "NaN", "inf"] {
            let err = prepare(entry(EvaluationType::Numeric, bad)).expect_err(bad);
            assert_eq!(err.message, "Please enter a valid number.");
        }
    }

    #[test]
    fn outcome_maps_failures_to_alerts() {
        let ok = outcome(&MarksResponse {
            http_status: 200,
            body: json!({ "new_mark_id": 901, "message": "Saved" }),
        });
        assert!(ok.saved);
        assert_eq!(ok.new_mark_id.as_deref(), Some("901"));
        assert_eq!(ok.alert, None);

        let failed = outcome(&MarksResponse {
            http_status: 403,
            body: json!({}),
        });
        assert!(!failed.saved);
        assert_eq!(failed.alert, Some(Alert::new(403, "Failed to update marks.")));
    }
}
