//! Timer engine implementation.
//!
//! The timer engine is a tick-counted state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` once
//! per second (the CLI and any embedding UI drive it from their own loop).
//! Elapsed time is therefore the number of ticks observed, which keeps the
//! recorded duration within one second of wall clock at the tick boundary.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Idle
//! ```
//!
//! Exactly one timer is active per engine; `start()` while running is
//! ignored. `stop()` finalizes the elapsed count and resets to zero - there
//! is no separate cancel path, an early stop persists whatever elapsed.

use chrono::Utc;

use crate::error::CoreError;
use crate::events::Event;
use crate::session::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
}

/// Caller-ticked session timer.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerState,
    elapsed_secs: u64,
    target: Option<Target>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            elapsed_secs: 0,
            target: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Whole minutes elapsed so far.
    pub fn elapsed_minutes(&self) -> u64 {
        self.elapsed_secs / 60
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting against `target`.
    ///
    /// Fails with [`CoreError::SelectionRequired`] when no target is given
    /// or a bible target lacks its book/chapter - nothing starts in that
    /// case. Returns `Ok(None)` while already running: re-entrant starts
    /// are ignored by construction.
    pub fn start(&mut self, target: Option<Target>) -> Result<Option<Target>, CoreError> {
        if self.state == TimerState::Running {
            return Ok(None);
        }
        let target = target
            .filter(|t| t.is_complete())
            .ok_or(CoreError::SelectionRequired)?;
        self.state = TimerState::Running;
        self.elapsed_secs = 0;
        self.target = Some(target.clone());
        Ok(Some(target))
    }

    /// Advance the count by one second. Call once per second while running.
    ///
    /// Returns `Some(Event::MinuteElapsed)` on each whole-minute boundary.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.elapsed_secs += 1;
        if self.elapsed_secs % 60 == 0 {
            return Some(Event::MinuteElapsed {
                minutes: self.elapsed_secs / 60,
                at: Utc::now(),
            });
        }
        None
    }

    /// Finalize the count, returning the elapsed seconds and the target the
    /// timer was counting against. The counter resets to zero.
    ///
    /// No-op (`None`) when no timer is running.
    pub fn stop(&mut self) -> Option<(u64, Target)> {
        if self.state != TimerState::Running {
            return None;
        }
        let elapsed = self.elapsed_secs;
        let target = self.target.take()?;
        self.state = TimerState::Idle;
        self.elapsed_secs = 0;
        Some((elapsed, target))
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}
