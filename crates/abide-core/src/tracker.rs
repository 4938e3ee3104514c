//! The public surface of the subsystem.
//!
//! A `Tracker` is one client's view: it owns the timer engine and the
//! active session handle, and wires the recorder, aggregator, and goal
//! reads over a shared store. The host drives `tick()` once per second and
//! calls the async operations from its event loop; nothing here spawns a
//! thread.
//!
//! Ordering is enforced by construction: `stop_session` needs the handle
//! that only a completed `start_session` produces, so within one client a
//! start always completes (or fails) before its stop is possible.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::feed::ChangeFeed;
use crate::progress::{monthly_percentage, Goals, MonthlyProgress, ProgressAggregator};
use crate::session::{ChapterProgress, SessionHandle, SessionRecorder, Target};
use crate::stats::{compute_streaks, StreakSummary};
use crate::store::GrowthStore;
use crate::timer::TimerEngine;

pub struct Tracker {
    store: Arc<dyn GrowthStore>,
    recorder: SessionRecorder,
    aggregator: ProgressAggregator,
    goals: Goals,
    engine: TimerEngine,
    active: Option<SessionHandle>,
    user_id: Option<Uuid>,
}

impl Tracker {
    pub fn new(store: Arc<dyn GrowthStore>, user_id: Option<Uuid>) -> Self {
        Self {
            recorder: SessionRecorder::new(store.clone()),
            aggregator: ProgressAggregator::new(store.clone()),
            goals: Goals::new(store.clone()),
            store,
            engine: TimerEngine::new(),
            active: None,
            user_id,
        }
    }

    fn user(&self) -> Result<Uuid> {
        self.user_id.ok_or(CoreError::NotAuthenticated)
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Record an open session row and start the timer against `target`.
    ///
    /// The row is written first; if the write fails the timer never starts
    /// (start and record succeed or fail together). Ignored (`Ok(None)`)
    /// while a session is already running.
    pub async fn start_session(&mut self, target: Option<Target>) -> Result<Option<Event>> {
        if self.engine.is_running() {
            return Ok(None);
        }
        let user_id = self.user()?;
        let target = target
            .filter(|t| t.is_complete())
            .ok_or(CoreError::SelectionRequired)?;

        let handle = self.recorder.start(user_id, target.clone()).await?;
        self.engine.start(Some(target.clone()))?;

        let event = Event::SessionStarted {
            session_id: handle.session_id(),
            kind: target.kind,
            book: target.book,
            chapter: target.chapter,
            at: Utc::now(),
        };
        self.active = Some(handle);
        Ok(Some(event))
    }

    /// Advance the running timer by one second. Call at 1 Hz.
    pub fn tick(&mut self) -> Option<Event> {
        self.engine.tick()
    }

    /// Stop the timer, finalize the session, and fold its minutes into the
    /// cumulative row. No-op (`Ok(None)`) when nothing is running.
    ///
    /// An early stop is the only cancellation there is: whatever elapsed,
    /// including zero, is persisted.
    pub async fn stop_session(&mut self) -> Result<Option<Event>> {
        let user_id = self.user()?;
        let Some((elapsed, _target)) = self.engine.stop() else {
            return Ok(None);
        };
        let Some(handle) = self.active.take() else {
            return Ok(None);
        };
        let session_id = handle.session_id();

        self.recorder.finish(handle, elapsed).await?;
        self.aggregator
            .record_minutes(user_id, elapsed / 60, Self::today())
            .await?;
        debug!(%session_id, elapsed, "session stopped");

        Ok(Some(Event::SessionFinalized {
            session_id,
            duration_seconds: elapsed,
            at: Utc::now(),
        }))
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.engine.elapsed_secs()
    }

    // ── Derived views ────────────────────────────────────────────────

    /// Whole minutes finalized today (UTC day).
    pub async fn today_minutes(&self) -> Result<u64> {
        let user_id = self.user()?;
        let start = Self::today()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc();
        let end = start + chrono::Duration::days(1);
        let seconds = self
            .store
            .finalized_seconds_between(user_id, start, end)
            .await?;
        Ok(seconds / 60)
    }

    /// Recompute streaks from the full session log.
    pub async fn streak(&self) -> Result<StreakSummary> {
        let user_id = self.user()?;
        let sessions = self.store.sessions_for_user(user_id).await?;
        Ok(compute_streaks(&sessions, Self::today()))
    }

    /// Current-month minutes against the month's goal.
    pub async fn monthly_progress(&self) -> Result<MonthlyProgress> {
        let user_id = self.user()?;
        let today = Self::today();
        let minutes = self.aggregator.month_minutes(user_id, today).await?;
        let target_minutes = self.goals.goal(user_id, today).await?;
        Ok(MonthlyProgress {
            minutes,
            target_minutes,
            percentage: monthly_percentage(minutes, target_minutes),
        })
    }

    pub async fn goal(&self) -> Result<i64> {
        self.goals.goal(self.user()?, Self::today()).await
    }

    pub async fn set_goal(&self, target_minutes: i64) -> Result<()> {
        self.goals
            .set_goal(self.user()?, Self::today(), target_minutes)
            .await
    }

    // ── Chapter progress ─────────────────────────────────────────────

    pub async fn mark_chapter_complete(&self, book: &str, chapter: u32) -> Result<()> {
        let user_id = self.user()?;
        self.store
            .mark_chapter_complete(user_id, book, chapter, Utc::now())
            .await?;
        Ok(())
    }

    pub async fn chapter_progress(
        &self,
        book: &str,
        chapter: u32,
    ) -> Result<Option<ChapterProgress>> {
        let user_id = self.user()?;
        Ok(self.store.chapter_progress(user_id, book, chapter).await?)
    }

    // ── Change feed ──────────────────────────────────────────────────

    /// The store's change feed, for surfaces that refresh on invalidation.
    pub fn feed(&self) -> ChangeFeed {
        self.store.feed()
    }
}
