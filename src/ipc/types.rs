use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::DaemonConfig;
use crate::pipeline::{Debouncer, Roster};
use crate::ratelimit::MemoryStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: DaemonConfig,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub roster: Roster,
    pub search_debounce: Debouncer,
    /// Limiter state when no workspace is open.
    pub limiter_memory: MemoryStore,
    /// Unsolicited lines (frame events) waiting to be written after the
    /// current response.
    pub events: Vec<serde_json::Value>,
}

impl AppState {
    pub fn new(config: DaemonConfig) -> Self {
        let search_debounce = Debouncer::new(config.search_debounce);
        AppState {
            config,
            workspace: None,
            db: None,
            roster: Roster::new(),
            search_debounce,
            limiter_memory: MemoryStore::default(),
            events: Vec::new(),
        }
    }

    pub fn take_events(&mut self) -> Vec<serde_json::Value> {
        std::mem::take(&mut self.events)
    }
}
