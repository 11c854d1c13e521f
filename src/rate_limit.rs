//! Per-caller request limit over a sliding one-minute window.

use crate::models::{LadderError, ParticipantId};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<ParticipantId, VecDeque<DateTime<Utc>>>>,
}

impl RateLimiter {
    pub fn per_minute(limit: usize) -> Self {
        Self {
            limit,
            window: Duration::minutes(1),
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request for `caller`, or fail if the window is already full.
    pub fn check(&self, caller: ParticipantId, now: DateTime<Utc>) -> Result<(), LadderError> {
        let mut hits = self.hits.lock().map_err(|_| LadderError::LockPoisoned)?;
        let window_start = now - self.window;
        let recent = hits.entry(caller).or_default();
        while recent.front().is_some_and(|t| *t <= window_start) {
            recent.pop_front();
        }
        if recent.len() >= self.limit {
            return Err(LadderError::RateLimited);
        }
        recent.push_back(now);
        Ok(())
    }

    /// Drop callers with no request inside the window.
    pub fn prune(&self, now: DateTime<Utc>) {
        let window_start = now - self.window;
        if let Ok(mut hits) = self.hits.lock() {
            hits.retain(|_, recent| recent.back().is_some_and(|t| *t > window_start));
        }
    }
}
