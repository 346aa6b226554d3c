use crate::filters::{matches_filters, FilterState, PenFilter};
use crate::record::{StudentRecord, StudentStats, StudentsResponse};
use crate::search::{matches_search, SearchField, SearchQuery};
use crate::sort::{self, SortDirection, SortKey, SortSpec};
use crate::view::{Counters, EmptyState, Frame, StudentCard};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// The single control state both surfaces read and write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controls {
    pub search: SearchQuery,
    pub filters: FilterState,
    pub sort: SortSpec,
}

/// Partial control update as sent by a surface.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ControlsPatch {
    pub search: Option<String>,
    pub search_in: Option<SearchField>,
    pub class: Option<String>,
    pub rte_only: Option<bool>,
    pub pen: Option<PenFilter>,
    pub gender: Option<String>,
    pub admission: Option<String>,
    /// `""` selects the default ordering.
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDirection>,
}

impl ControlsPatch {
    /// Only a text change is debounced; every other control applies at once.
    pub fn is_search_only(&self) -> bool {
        self.search.is_some()
            && self.search_in.is_none()
            && self.class.is_none()
            && self.rte_only.is_none()
            && self.pen.is_none()
            && self.gender.is_none()
            && self.admission.is_none()
            && self.sort_by.is_none()
            && self.sort_dir.is_none()
    }
}

pub fn parse_sort_key(raw: &str) -> Result<Option<SortKey>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_value::<SortKey>(json!(raw))
        .map(Some)
        .map_err(|_| format!("unknown sort key: {raw}"))
}

impl Controls {
    /// Applies `patch`; returns whether anything changed.
    pub fn apply(&mut self, patch: ControlsPatch) -> Result<bool, String> {
        let before = self.clone();
        if let Some(raw) = patch.sort_by.as_deref() {
            self.sort.key = parse_sort_key(raw)?;
        }
        if let Some(text) = patch.search {
            self.search.text = text;
        }
        if let Some(field) = patch.search_in {
            self.search.field = field;
        }
        if let Some(class) = patch.class.as_deref() {
            self.filters.set_class(class);
        }
        if let Some(rte) = patch.rte_only {
            self.filters.rte_only = rte;
        }
        if let Some(pen) = patch.pen {
            self.filters.pen = pen;
        }
        if let Some(gender) = patch.gender.as_deref() {
            self.filters.set_gender(gender);
        }
        if let Some(admission) = patch.admission.as_deref() {
            self.filters.set_admission(admission);
        }
        if let Some(dir) = patch.sort_dir {
            self.sort.direction = dir;
        }
        Ok(*self != before)
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "search": self.search.text,
            "searchIn": self.search.field,
            "class": self.filters.class_wire(),
            "rteOnly": self.filters.rte_only,
            "pen": self.filters.pen,
            "gender": self.filters.gender_wire(),
            "admission": self.filters.admission_wire(),
            "sortBy": self.sort.key.map(|k| json!(k)).unwrap_or_else(|| json!("")),
            "sortDir": self.sort.direction,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Desktop,
    Mobile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub id: Uuid,
    pub surface: Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadStatus {
    NotLoaded,
    Loaded,
    NoData,
    Failed,
}

/// Roster state container: holds the fetched records, the shared
/// controls, and the set of surfaces listening for frames.
#[derive(Debug)]
pub struct Roster {
    records: Vec<StudentRecord>,
    stats: Option<StudentStats>,
    controls: Controls,
    status: LoadStatus,
    generation: u64,
    subscribers: Vec<Subscriber>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    pub fn new() -> Self {
        Roster {
            records: Vec::new(),
            stats: None,
            controls: Controls::default(),
            status: LoadStatus::NotLoaded,
            generation: 0,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole collection. Controls survive a reload.
    pub fn set_records(&mut self, records: Vec<StudentRecord>) {
        self.status = if records.is_empty() {
            LoadStatus::NoData
        } else {
            LoadStatus::Loaded
        };
        self.records = records;
        self.generation += 1;
    }

    pub fn load_response(&mut self, response: StudentsResponse) {
        if response.is_success() {
            self.stats = response.stats;
            self.set_records(response.students);
        } else {
            self.stats = None;
            self.set_records(Vec::new());
        }
    }

    /// A failed fetch leaves no records behind so counts cannot go stale.
    pub fn mark_load_failed(&mut self) {
        self.records.clear();
        self.stats = None;
        self.status = LoadStatus::Failed;
        self.generation += 1;
    }

    pub fn stats(&self) -> Option<&StudentStats> {
        self.stats.as_ref()
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.status != LoadStatus::NotLoaded
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn update_controls(&mut self, patch: ControlsPatch) -> Result<bool, String> {
        self.controls.apply(patch)
    }

    pub fn clear_controls(&mut self) -> bool {
        let changed = self.controls != Controls::default();
        self.controls = Controls::default();
        changed
    }

    pub fn toggle_sort_direction(&mut self) -> SortDirection {
        self.controls.sort.direction = self.controls.sort.direction.flipped();
        self.controls.sort.direction
    }

    /// filter, then sort.
    pub fn visible(&self) -> Vec<&StudentRecord> {
        let c = &self.controls;
        let mut rows: Vec<&StudentRecord> = self
            .records
            .iter()
            .filter(|r| matches_search(r, &c.search.text, c.search.field))
            .filter(|r| matches_filters(r, &c.filters))
            .collect();
        sort::sort_records(&mut rows, c.sort);
        rows
    }

    pub fn counters(&self) -> Counters {
        Counters {
            visible: self.visible().len(),
            total: self.total(),
        }
    }

    pub fn frame(&self) -> Frame {
        let visible = self.visible();
        let empty = if !visible.is_empty() {
            None
        } else {
            match self.status {
                LoadStatus::Failed => Some(EmptyState::LoadError),
                LoadStatus::NoData => Some(EmptyState::NoData),
                LoadStatus::NotLoaded => Some(EmptyState::Loading),
                LoadStatus::Loaded => Some(EmptyState::NoMatches),
            }
        };
        Frame {
            generation: self.generation,
            counters: Counters {
                visible: visible.len(),
                total: self.total(),
            },
            cards: visible.into_iter().map(StudentCard::from_record).collect(),
            empty,
        }
    }

    /// Distinct class labels in default roster order.
    pub fn classes(&self) -> Vec<String> {
        let mut rows: Vec<&StudentRecord> = self.records.iter().collect();
        sort::sort_records(&mut rows, SortSpec::default());
        let mut out: Vec<String> = Vec::new();
        for r in rows {
            if let Some(class) = r.class.as_deref().filter(|c| !c.is_empty()) {
                if !out.iter().any(|c| c == class) {
                    out.push(class.to_string());
                }
            }
        }
        out
    }

    pub fn find(&self, id: &str) -> Option<&StudentRecord> {
        self.records.iter().find(|r| r.id.as_deref() == Some(id))
    }

    pub fn subscribe(&mut self, surface: Surface) -> Uuid {
        let id = Uuid::new_v4();
        self.subscribers.push(Subscriber { id, surface });
        id
    }

    pub fn unsubscribe(&mut self, id: &Uuid) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| &s.id != id);
        self.subscribers.len() != before
    }

    pub fn subscribers(&self) -> &[Subscriber] {
        &self.subscribers
    }
}

/// Trailing-edge debounce for the publish that follows a search edit.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Pushes the deadline out; repeated calls coalesce into one fire.
    /// An unrepresentable deadline fires on the next check.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now.checked_add(self.delay).unwrap_or(now));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once, when the deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
