use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

pub const STORAGE_KEY: &str = "wa_global_limit";

/// Persisted limiter state, `{lastSent, count, date}` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitState {
    #[serde(default)]
    pub last_sent: i64,
    #[serde(default)]
    pub count: u32,
    /// UTC `YYYY-MM-DD` the count belongs to.
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitPolicy {
    pub min_gap_ms: i64,
    /// Each attempt adds a random `0..jitter_ms` to the gap.
    pub jitter_ms: i64,
    pub daily_cap: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        RateLimitPolicy {
            min_gap_ms: 10_000,
            jitter_ms: 5_000,
            daily_cap: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Wait { seconds: i64 },
    DailyCap { cap: u32 },
}

impl Rejection {
    pub fn message(&self) -> String {
        match self {
            Rejection::Wait { seconds } => format!(
                "Please wait {seconds} seconds before sending another message."
            ),
            Rejection::DailyCap { cap } => format!("Daily limit of {cap} messages reached."),
        }
    }
}

pub trait LimitStore {
    fn load(&self) -> anyhow::Result<LimitState>;
    fn save(&self, state: &LimitState) -> anyhow::Result<()>;
}

/// Process-lifetime store used when no workspace is open.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<LimitState>,
}

impl LimitStore for MemoryStore {
    fn load(&self) -> anyhow::Result<LimitState> {
        Ok(self.state.borrow().clone())
    }

    fn save(&self, state: &LimitState) -> anyhow::Result<()> {
        *self.state.borrow_mut() = state.clone();
        Ok(())
    }
}

pub struct RateLimiter<'a, S: LimitStore + ?Sized> {
    store: &'a S,
    policy: RateLimitPolicy,
}

impl<'a, S: LimitStore + ?Sized> RateLimiter<'a, S> {
    pub fn new(store: &'a S, policy: RateLimitPolicy) -> Self {
        RateLimiter { store, policy }
    }

    /// Decides whether a send may happen at `now`. A granted send is
    /// recorded immediately; a rejected one leaves the stored state alone.
    pub fn try_acquire<R: Rng>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> anyhow::Result<Result<LimitState, Rejection>> {
        let mut state = self.store.load()?;
        let today = now.format("%Y-%m-%d").to_string();
        if state.date != today {
            state.count = 0;
            state.date = today;
        }

        let jitter = if self.policy.jitter_ms > 0 {
            rng.gen_range(0..self.policy.jitter_ms)
        } else {
            0
        };
        let gap = self.policy.min_gap_ms.saturating_add(jitter);
        let now_ms = now.timestamp_millis();
        let elapsed = now_ms.saturating_sub(state.last_sent);
        if elapsed < gap {
            let wait_ms = gap.saturating_sub(elapsed);
            return Ok(Err(Rejection::Wait {
                seconds: wait_ms.saturating_add(999) / 1000,
            }));
        }

        if state.count >= self.policy.daily_cap {
            return Ok(Err(Rejection::DailyCap {
                cap: self.policy.daily_cap,
            }));
        }

        state.last_sent = now_ms;
        state.count = state.count.saturating_add(1);
        self.store.save(&state)?;
        Ok(Ok(state))
    }

    pub fn status(&self, now: DateTime<Utc>) -> anyhow::Result<LimitState> {
        let mut state = self.store.load()?;
        if state.date != now.format("%Y-%m-%d").to_string() {
            state.count = 0;
        }
        Ok(state)
    }
}
