use crate::ratelimit::RateLimitPolicy;
use rusqlite::Connection;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 180;
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const RATE_LIMIT_SETTING: &str = "messaging.rateLimit";
/// Upper bound for the debounce and for limiter gap/jitter overrides (one day).
pub const MAX_DELAY_MS: u64 = 86_400_000;

/// Settings keys `settings.set` accepts.
pub const WRITABLE_SETTINGS: [&str; 1] = [RATE_LIMIT_SETTING];

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
    pub search_debounce: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfig {
            workspace: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = DaemonConfig::default();
        if let Some(ws) = lookup("ROSTERD_WORKSPACE").filter(|s| !s.trim().is_empty()) {
            cfg.workspace = Some(PathBuf::from(ws));
        }
        if let Some(filter) = lookup("ROSTERD_LOG").filter(|s| !s.trim().is_empty()) {
            cfg.log_filter = filter;
        }
        if let Some(ms) = lookup("ROSTERD_SEARCH_DEBOUNCE_MS").and_then(|s| s.trim().parse::<u64>().ok()) {
            cfg.search_debounce = Duration::from_millis(ms.min(MAX_DELAY_MS));
        }
        cfg
    }
}

/// Workspace override for the messaging limiter; any field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RateLimitOverride {
    pub min_gap_ms: Option<i64>,
    pub jitter_ms: Option<i64>,
    pub daily_cap: Option<u32>,
}

impl RateLimitOverride {
    pub fn validate(&self) -> Result<(), String> {
        let max = MAX_DELAY_MS as i64;
        if self.min_gap_ms.is_some_and(|v| !(0..=max).contains(&v)) {
            return Err(format!("minGapMs must be between 0 and {max}"));
        }
        if self.jitter_ms.is_some_and(|v| !(0..=max).contains(&v)) {
            return Err(format!("jitterMs must be between 0 and {max}"));
        }
        Ok(())
    }

    pub fn apply(&self, base: RateLimitPolicy) -> RateLimitPolicy {
        RateLimitPolicy {
            min_gap_ms: self.min_gap_ms.unwrap_or(base.min_gap_ms),
            jitter_ms: self.jitter_ms.unwrap_or(base.jitter_ms),
            daily_cap: self.daily_cap.unwrap_or(base.daily_cap),
        }
    }
}

/// Effective limiter policy: defaults, then the workspace override if present
/// and well-formed.
pub fn rate_limit_policy(conn: Option<&Connection>) -> RateLimitPolicy {
    let base = RateLimitPolicy::default();
    let Some(conn) = conn else {
        return base;
    };
    match crate::db::settings_get_json(conn, RATE_LIMIT_SETTING) {
        Ok(Some(v)) => match serde_json::from_value::<RateLimitOverride>(v) {
            Ok(o) if o.validate().is_ok() => o.apply(base),
            _ => {
                tracing::warn!(key = RATE_LIMIT_SETTING, "ignoring malformed setting");
                base
            }
        },
        Ok(None) => base,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read rate limit setting");
            base
        }
    }
}
