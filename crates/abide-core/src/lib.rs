//! # Abide Core Library
//!
//! Core business logic for Abide's reading-activity tracking: timed
//! prayer and Bible-reading sessions, day streaks, and monthly
//! cumulative-minutes progress. The CLI binary is a thin layer over this
//! library, as any GUI surface would be.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-counted state machine; the caller invokes
//!   `tick()` once per second, no internal threads
//! - **Session Recorder**: the append-mostly session log every derived
//!   statistic is recomputed from
//! - **Streak Calculator**: consecutive-day streaks, derived on demand
//! - **Progress Aggregator**: lifetime and current-month minute totals
//!   with calendar-month rollover and conflict-checked writes
//! - **Store**: the persistence boundary trait plus the SQLite adapter
//!   and its change feed
//!
//! ## Key Components
//!
//! - [`Tracker`]: one client's public surface over all of the above
//! - [`TimerEngine`]: core timer state machine
//! - [`SqliteStore`]: bundled store adapter
//! - [`Config`]: application configuration management

pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod progress;
pub mod session;
pub mod stats;
pub mod store;
pub mod timer;
pub mod tracker;

pub use config::Config;
pub use error::{CoreError, Result, StoreError};
pub use events::Event;
pub use feed::{Change, ChangeFeed, Subscription, Table};
pub use progress::{CumulativeProgress, Goals, MonthlyProgress, ProgressAggregator};
pub use session::{ActivityKind, ChapterProgress, ReadingSession, SessionRecorder, Target};
pub use stats::{compute_streaks, StreakSummary};
pub use store::{GrowthStore, SqliteStore};
pub use timer::{TimerEngine, TimerState};
pub use tracker::Tracker;
