//! View models for the roster page. Everything here is a pure function
//! of a record (or the stats block); the host turns these into markup.

use crate::record::{StudentRecord, StudentStats};
use serde::Serialize;

const DRIVE_THUMBNAIL_BASE: &str = "https://lh3.googleusercontent.com/d/";
const BOY_PLACEHOLDER: &str = "/static/no-student-boy-image.png";
const GIRL_PLACEHOLDER: &str = "/static/no-student-girl-image.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub visible: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    Loading,
    NoMatches,
    NoData,
    LoadError,
}

impl EmptyState {
    pub fn title(self) -> &'static str {
        match self {
            EmptyState::Loading => "Loading students",
            EmptyState::NoMatches => "No students found",
            EmptyState::NoData => "No Students Found",
            EmptyState::LoadError => "Error Loading Data",
        }
    }

    pub fn hint(self) -> Option<&'static str> {
        match self {
            EmptyState::NoData => {
                Some("Try adjusting your search criteria or add new students")
            }
            EmptyState::LoadError => {
                Some("Failed to load student data. Please try refreshing the page.")
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Badge {
    #[serde(rename = "RTE")]
    Rte,
    #[serde(rename = "NEW")]
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCard {
    pub id: String,
    pub name: String,
    pub father_line: String,
    pub class_label: String,
    pub roll: String,
    pub dob: String,
    pub phone: String,
    pub phone_href: String,
    pub image_url: String,
    pub badges: Vec<Badge>,
    pub is_new: bool,
    pub status: String,
    pub pen: String,
    pub edit_href: String,
    pub fee_session_id: String,
}

fn text(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

impl StudentCard {
    pub fn from_record(record: &StudentRecord) -> Self {
        let id = text(&record.id);
        let phone = text(&record.phone);

        let mut badges = Vec::new();
        if record.is_rte {
            badges.push(Badge::Rte);
        }
        if record.student_status.as_deref() == Some("new") {
            badges.push(Badge::New);
        }

        StudentCard {
            father_line: format!("C/O Mr. {}", text(&record.father_name)),
            edit_href: format!("/update_student_info?id={id}"),
            phone_href: format!("tel:{phone}"),
            image_url: image_url(record),
            name: text(&record.name),
            class_label: text(&record.class),
            roll: text(&record.roll),
            dob: text(&record.dob),
            is_new: record.is_new(),
            status: text(&record.student_status),
            pen: text(&record.pen),
            fee_session_id: text(&record.student_session_id),
            badges,
            phone,
            id,
        }
    }
}

fn image_url(record: &StudentRecord) -> String {
    match record.image.as_deref().filter(|s| !s.is_empty()) {
        Some(image) => format!("{DRIVE_THUMBNAIL_BASE}{image}=s200"),
        None => {
            let male = record
                .gender
                .as_deref()
                .map(|g| g.eq_ignore_ascii_case("male"))
                .unwrap_or(false);
            if male {
                BOY_PLACEHOLDER.to_string()
            } else {
                GIRL_PLACEHOLDER.to_string()
            }
        }
    }
}

/// One pipeline output, rendered once and delivered to every surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub generation: u64,
    pub counters: Counters,
    pub cards: Vec<StudentCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<EmptyState>,
}

impl Frame {
    pub fn to_json(&self) -> serde_json::Value {
        let mut v = serde_json::to_value(self).unwrap_or_default();
        if let Some(empty) = self.empty {
            v["emptyTitle"] = serde_json::json!(empty.title());
            if let Some(hint) = empty.hint() {
                v["emptyHint"] = serde_json::json!(hint);
            }
        }
        v
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

fn trend(v: f64) -> Trend {
    if v > 0.0 {
        Trend::Up
    } else {
        Trend::Down
    }
}

fn signed_percent(v: Option<f64>) -> String {
    match v {
        Some(p) if p > 0.0 => format!("+{p:.1}%"),
        Some(p) => format!("{p:.1}%"),
        None => "N/A%".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_students: i64,
    pub total_girls: i64,
    pub total_boys: i64,
    pub yoy_label: String,
    pub yoy_trend: Trend,
    pub new_students: i64,
    pub old_students: i64,
    pub growth_label: String,
    pub new_growth_label: String,
    pub new_growth_trend: Trend,
    pub new_students_prev: i64,
    pub previous_year_students_total: i64,
}

impl StatsView {
    pub fn from_stats(stats: &StudentStats) -> Self {
        let inc = stats.increased_students;
        let sign = if inc > 0 { "+" } else { "" };
        let new_growth = stats.new_students_growth_percentage;
        StatsView {
            total_students: stats.total_students,
            total_girls: stats.total_girls,
            total_boys: stats.total_boys,
            yoy_label: format!("{sign}{inc} students YoY"),
            yoy_trend: trend(inc as f64),
            new_students: stats.new_students,
            old_students: stats.old_students,
            growth_label: signed_percent(stats.total_growth_percentage),
            new_growth_label: format!("{} from last year", signed_percent(new_growth)),
            new_growth_trend: trend(new_growth.unwrap_or(0.0)),
            new_students_prev: stats.new_students_prev,
            previous_year_students_total: stats.previous_year_students_total,
        }
    }
}

/// A user-visible alert `{status, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub status: u16,
    pub message: String,
}

impl Alert {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Alert {
            status,
            message: message.into(),
        }
    }
}
