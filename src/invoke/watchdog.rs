// src/invoke/watchdog.rs

//! Time budget for one invocation.
//!
//! Two independent limits:
//! - `timeout` is a *progress* budget. It is measured from the last loop
//!   iteration that moved at least one byte, so a tool that streams slowly is
//!   left alone while a tool that stops moving data is declared hung.
//! - `max_runtime` is measured from spawn and fires regardless of progress.
//!
//! The `*_at` variants take an explicit `now` so the arithmetic can be
//! exercised without sleeping.

use std::time::Duration;

use tokio::time::Instant;

/// Which limit fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// No byte moved for the whole `timeout` budget.
    Stalled,
    /// `max_runtime` elapsed.
    MaxRuntime,
}

#[derive(Debug, Clone)]
pub struct Watchdog {
    timeout: Option<Duration>,
    max_runtime: Option<Duration>,
    started: Instant,
    last_progress: Instant,
    stalls: u64,
    fired: Option<Expiry>,
}

impl Watchdog {
    pub fn new(timeout: Option<Duration>, max_runtime: Option<Duration>) -> Self {
        Self::starting_at(timeout, max_runtime, Instant::now())
    }

    pub fn starting_at(
        timeout: Option<Duration>,
        max_runtime: Option<Duration>,
        now: Instant,
    ) -> Self {
        Self {
            timeout,
            max_runtime,
            started: now,
            last_progress: now,
            stalls: 0,
            fired: None,
        }
    }

    /// `true` when neither limit is configured; such a watchdog never fires.
    pub fn is_unbounded(&self) -> bool {
        self.timeout.is_none() && self.max_runtime.is_none()
    }

    fn stall_budget_left(&self, now: Instant) -> Option<Duration> {
        self.timeout
            .map(|t| t.saturating_sub(now.saturating_duration_since(self.last_progress)))
    }

    fn runtime_left(&self, now: Instant) -> Option<Duration> {
        self.max_runtime
            .map(|m| m.saturating_sub(now.saturating_duration_since(self.started)))
    }

    /// Budget left before the watchdog fires; `None` means unbounded.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        match (self.stall_budget_left(now), self.runtime_left(now)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(Instant::now())
    }

    /// How long the next readiness wait may block: the remaining budget,
    /// capped by `poll_interval`.
    pub fn next_wait_at(&self, now: Instant, poll_interval: Duration) -> Duration {
        match self.remaining_at(now) {
            Some(left) => left.min(poll_interval),
            None => poll_interval,
        }
    }

    pub fn next_wait(&self, poll_interval: Duration) -> Duration {
        self.next_wait_at(Instant::now(), poll_interval)
    }

    /// Check both limits; the first expiry seen is latched and returned on
    /// every later call.
    pub fn check_at(&mut self, now: Instant) -> Option<Expiry> {
        if self.fired.is_some() {
            return self.fired;
        }
        if self.runtime_left(now) == Some(Duration::ZERO) {
            self.fired = Some(Expiry::MaxRuntime);
        } else if self.stall_budget_left(now) == Some(Duration::ZERO) {
            self.fired = Some(Expiry::Stalled);
        }
        self.fired
    }

    pub fn check(&mut self) -> Option<Expiry> {
        self.check_at(Instant::now())
    }

    pub fn record_progress_at(&mut self, now: Instant) {
        self.last_progress = now;
    }

    pub fn record_progress(&mut self) {
        self.record_progress_at(Instant::now());
    }

    /// Count a wait that moved no bytes while the child was still running.
    pub fn record_stall(&mut self) {
        self.stalls += 1;
    }

    pub fn stalls(&self) -> u64 {
        self.stalls
    }

    pub fn fired(&self) -> Option<Expiry> {
        self.fired
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
