use crate::record::{norm, StudentRecord};
use serde::{Deserialize, Serialize};

/// Field a search query is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchField {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "STUDENTS_NAME")]
    Name,
    #[serde(rename = "FATHERS_NAME")]
    FatherName,
    #[serde(rename = "ADMISSION_NO")]
    AdmissionNo,
    #[serde(rename = "ROLL")]
    Roll,
    #[serde(rename = "PHONE")]
    Phone,
    #[serde(rename = "AADHAAR")]
    Aadhaar,
    #[serde(rename = "CLASS")]
    Class,
    #[serde(rename = "PEN")]
    Pen,
}

/// Fields consulted when the scope is `all`.
pub const GLOBAL_FIELDS: [SearchField; 8] = [
    SearchField::Name,
    SearchField::FatherName,
    SearchField::AdmissionNo,
    SearchField::Roll,
    SearchField::Phone,
    SearchField::Aadhaar,
    SearchField::Class,
    SearchField::Pen,
];

impl SearchField {
    fn value_of(self, record: &StudentRecord) -> Option<&str> {
        match self {
            SearchField::All => None,
            SearchField::Name => record.name.as_deref(),
            SearchField::FatherName => record.father_name.as_deref(),
            SearchField::AdmissionNo => record.admission_no.as_deref(),
            SearchField::Roll => record.roll.as_deref(),
            SearchField::Phone => record.phone.as_deref(),
            SearchField::Aadhaar => record.aadhaar.as_deref(),
            SearchField::Class => record.class.as_deref(),
            SearchField::Pen => record.pen.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub text: String,
    pub field: SearchField,
}

/// Token match against one field. `token` is already lower-cased.
pub fn field_matches(record: &StudentRecord, field: SearchField, token: &str) -> bool {
    let value = norm(field.value_of(record));
    if value.is_empty() {
        return false;
    }
    match field {
        // Partial roll entry ("2" finds 12, 22).
        SearchField::Roll => value == token || value.ends_with(token),
        // Last-four-digit lookups on phone and Aadhaar.
        SearchField::Phone | SearchField::Aadhaar => {
            value.ends_with(token) || value.contains(token)
        }
        _ => value.contains(token),
    }
}

pub fn matches_search(record: &StudentRecord, query: &str, scope: SearchField) -> bool {
    let q = query.to_lowercase();
    let mut tokens = q.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return true;
    }
    tokens.all(|token| match scope {
        SearchField::All => GLOBAL_FIELDS
            .iter()
            .any(|f| field_matches(record, *f, token)),
        field => field_matches(record, field, token),
    })
}
