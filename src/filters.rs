use crate::record::{norm, StudentRecord};
use serde::{Deserialize, Serialize};

pub const ALL_CLASSES: &str = "All";
pub const ANY: &str = "any";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenFilter {
    #[default]
    Any,
    Present,
    Missing,
}

/// Categorical filters. `None` on the optional fields is the pass-through
/// sentinel (`"All"` for class, `"any"` otherwise).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub class: Option<String>,
    pub rte_only: bool,
    pub pen: PenFilter,
    /// Stored lower-cased.
    pub gender: Option<String>,
    pub admission: Option<String>,
}

impl FilterState {
    pub fn set_class(&mut self, raw: &str) {
        self.class = (raw != ALL_CLASSES).then(|| raw.to_string());
    }

    pub fn set_gender(&mut self, raw: &str) {
        let lowered = raw.to_lowercase();
        self.gender = (lowered != ANY).then_some(lowered);
    }

    pub fn set_admission(&mut self, raw: &str) {
        self.admission = (raw != ANY).then(|| raw.to_string());
    }

    pub fn class_wire(&self) -> &str {
        self.class.as_deref().unwrap_or(ALL_CLASSES)
    }

    pub fn gender_wire(&self) -> &str {
        self.gender.as_deref().unwrap_or(ANY)
    }

    pub fn admission_wire(&self) -> &str {
        self.admission.as_deref().unwrap_or(ANY)
    }
}

pub fn matches_filters(record: &StudentRecord, filters: &FilterState) -> bool {
    if let Some(class) = filters.class.as_deref() {
        if record.class.as_deref().unwrap_or_default() != class {
            return false;
        }
    }

    if filters.rte_only && !record.is_rte {
        return false;
    }

    match filters.pen {
        PenFilter::Any => {}
        PenFilter::Present if !record.has_pen() => return false,
        PenFilter::Missing if record.has_pen() => return false,
        _ => {}
    }

    if let Some(gender) = filters.gender.as_deref() {
        if norm(record.gender.as_deref()) != gender {
            return false;
        }
    }

    if let Some(status) = filters.admission.as_deref() {
        if record.student_status.as_deref() != Some(status) {
            return false;
        }
    }

    true
}
