use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One row of `GET /api/get_students_data`.
///
/// The backend emits scalars in whatever type its columns have (ROLL and
/// PHONE are integers, PEN may be null), so every scalar is normalized to
/// optional text on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default, deserialize_with = "scalar_text")]
    pub id: Option<String>,
    #[serde(rename = "STUDENTS_NAME", default, deserialize_with = "scalar_text")]
    pub name: Option<String>,
    #[serde(rename = "FATHERS_NAME", default, deserialize_with = "scalar_text")]
    pub father_name: Option<String>,
    #[serde(rename = "CLASS", default, deserialize_with = "scalar_text")]
    pub class: Option<String>,
    #[serde(rename = "ROLL", default, deserialize_with = "scalar_text")]
    pub roll: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub display_order: Option<String>,
    #[serde(rename = "ADMISSION_NO", default, deserialize_with = "scalar_text")]
    pub admission_no: Option<String>,
    #[serde(rename = "ADMISSION_DATE", default, deserialize_with = "scalar_text")]
    pub admission_date: Option<String>,
    #[serde(rename = "ADMISSION_SESSION", default, deserialize_with = "scalar_text")]
    pub admission_session: Option<String>,
    #[serde(rename = "PEN", default, deserialize_with = "scalar_text")]
    pub pen: Option<String>,
    #[serde(rename = "AADHAAR", default, deserialize_with = "scalar_text")]
    pub aadhaar: Option<String>,
    #[serde(rename = "PHONE", default, deserialize_with = "scalar_text")]
    pub phone: Option<String>,
    #[serde(rename = "GENDER", default, deserialize_with = "scalar_text")]
    pub gender: Option<String>,
    #[serde(rename = "DOB", default, deserialize_with = "scalar_text")]
    pub dob: Option<String>,
    #[serde(rename = "IMAGE", default, deserialize_with = "scalar_text")]
    pub image: Option<String>,
    #[serde(rename = "is_RTE", default, deserialize_with = "loose_bool")]
    pub is_rte: bool,
    #[serde(default, deserialize_with = "scalar_text")]
    pub student_status: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub student_session_id: Option<String>,
    /// Server-computed admission flag. When present it wins over the local rule.
    #[serde(
        rename = "is_new",
        default,
        deserialize_with = "optional_loose_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_is_new: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl StudentRecord {
    pub fn is_new(&self) -> bool {
        match self.server_is_new {
            Some(v) => v,
            None => admission_in_session(
                self.admission_no.as_deref(),
                self.admission_session.as_deref(),
            ),
        }
    }

    /// PEN counts as present only when it has non-whitespace content.
    pub fn has_pen(&self) -> bool {
        self.pen
            .as_deref()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Admission numbers are prefixed with the two-digit year of the session
/// the student was admitted in. This is the only place the rule lives.
pub fn admission_in_session(admission_no: Option<&str>, admission_session: Option<&str>) -> bool {
    let Some(no) = admission_no.filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(session) = admission_session.filter(|s| !s.is_empty()) else {
        return false;
    };
    let chars: Vec<char> = session.chars().collect();
    let suffix: String = chars[chars.len().saturating_sub(2)..].iter().collect();
    no.starts_with(&suffix)
}

/// Statistics block that accompanies the students payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentStats {
    #[serde(default)]
    pub total_students: i64,
    #[serde(default)]
    pub total_girls: i64,
    #[serde(default)]
    pub total_boys: i64,
    #[serde(default)]
    pub new_students: i64,
    #[serde(default)]
    pub old_students: i64,
    #[serde(default)]
    pub increased_students: i64,
    #[serde(default)]
    pub new_students_growth_percentage: Option<f64>,
    #[serde(default)]
    pub previous_year_students_total: i64,
    #[serde(default)]
    pub total_growth_percentage: Option<f64>,
    #[serde(default)]
    pub new_students_prev: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub students: Vec<StudentRecord>,
    #[serde(default)]
    pub stats: Option<StudentStats>,
}

impl StudentsResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Lower-cased text of a field; absent values become the empty string.
pub fn norm(v: Option<&str>) -> String {
    v.map(|s| s.to_lowercase()).unwrap_or_default()
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn optional_loose_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.and_then(|v| value_as_bool(&v)))
}

fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_loose_bool(deserializer)?.unwrap_or(false))
}

fn value_as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
