//! Provider request budget
//!
//! Two counters: a sliding 60 s window and a 24 h window that resets when it
//! has run its course. Both run on wall-clock time from a [`Clock`], never on
//! ticks.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::llm::provider::RateLimit;

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct RateLimiter {
    limit: RateLimit,
    clock: Arc<dyn Clock>,
    /// Admission times inside the last minute, oldest first
    minute: VecDeque<Instant>,
    day_started: Option<Instant>,
    day_count: u32,
}

impl RateLimiter {
    pub fn new(limit: RateLimit, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            clock,
            minute: VecDeque::new(),
            day_started: None,
            day_count: 0,
        }
    }

    fn roll(&mut self, now: Instant) {
        while let Some(&oldest) = self.minute.front() {
            if now.duration_since(oldest) >= MINUTE {
                self.minute.pop_front();
            } else {
                break;
            }
        }
        if let Some(start) = self.day_started {
            if now.duration_since(start) >= DAY {
                self.day_started = None;
                self.day_count = 0;
            }
        }
    }

    /// Take one request slot if both budgets allow it
    pub fn try_acquire(&mut self) -> bool {
        let now = self.clock.now();
        self.roll(now);

        let per_minute = self.limit.requests_per_minute;
        let per_day = self.limit.requests_per_day;
        if per_minute > 0 && self.minute.len() >= per_minute as usize {
            return false;
        }
        if per_day > 0 && self.day_count >= per_day {
            return false;
        }

        if per_minute > 0 {
            self.minute.push_back(now);
        }
        if self.day_started.is_none() {
            self.day_started = Some(now);
        }
        self.day_count = self.day_count.saturating_add(1);
        true
    }

    /// Requests admitted in the current day window
    pub fn used_today(&mut self) -> u32 {
        let now = self.clock.now();
        self.roll(now);
        self.day_count
    }
}
