//! Derived statistics.
//!
//! Everything here is recomputed from the session log on demand - nothing
//! is cached or persisted, so the log and the displayed numbers cannot
//! drift apart.

mod streak;

pub use streak::{compute_streaks, StreakSummary};
