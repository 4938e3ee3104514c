//! Cumulative minute totals with monthly rollover.
//!
//! One row per user: a lifetime total that never decreases and a
//! current-month counter that resets the first time an update lands after
//! the calendar month has changed. The row is the single source of truth
//! for goal-progress displays.
//!
//! Two clients finalizing sessions for the same user can race on this row.
//! The write is therefore conditional on the version read, and a lost race
//! re-fetches and re-folds (bounded retry). Persistence failures are not
//! retried - they surface once and leave prior state unchanged.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{CoreError, StoreError};
use crate::progress::{month_start, same_month};
use crate::store::GrowthStore;

/// Attempts per record before a conflict is surfaced to the caller.
const MAX_CONFLICT_RETRIES: u32 = 3;

/// Per-user cumulative row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CumulativeProgress {
    pub user_id: Uuid,
    /// Lifetime minutes. Monotonic.
    pub total_minutes: u64,
    /// Minutes accumulated in the month starting at `last_reset_date`.
    pub current_month_minutes: u64,
    /// First day of the month currently being accumulated.
    pub last_reset_date: NaiveDate,
    /// Optimistic-concurrency counter, bumped on every write.
    pub version: i64,
}

impl CumulativeProgress {
    /// The month counter as of `today`: a row whose accumulating month is
    /// already over contributes nothing until its next rollover write.
    pub fn month_minutes_as_of(&self, today: NaiveDate) -> u64 {
        if same_month(self.last_reset_date, today) {
            self.current_month_minutes
        } else {
            0
        }
    }
}

/// Fold one increment into the row: create, accumulate, or roll over.
fn fold(
    user_id: Uuid,
    prior: Option<&CumulativeProgress>,
    minutes: u64,
    today: NaiveDate,
) -> CumulativeProgress {
    let first_of_month = month_start(today);
    match prior {
        None => CumulativeProgress {
            user_id,
            total_minutes: minutes,
            current_month_minutes: minutes,
            last_reset_date: first_of_month,
            version: 1,
        },
        Some(row) if same_month(row.last_reset_date, today) => CumulativeProgress {
            user_id,
            total_minutes: row.total_minutes + minutes,
            current_month_minutes: row.current_month_minutes + minutes,
            last_reset_date: row.last_reset_date,
            version: row.version + 1,
        },
        // Month changed since the last write: reset the month counter, then
        // apply this increment. The lifetime total still grows.
        Some(row) => CumulativeProgress {
            user_id,
            total_minutes: row.total_minutes + minutes,
            current_month_minutes: minutes,
            last_reset_date: first_of_month,
            version: row.version + 1,
        },
    }
}

/// Goal progress for one month, as displayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyProgress {
    pub minutes: u64,
    pub target_minutes: i64,
    /// Clamped to [0, 100]; a non-positive target reads as 0%.
    pub percentage: f64,
}

/// Percentage of `target` reached, clamped to [0, 100].
///
/// Non-positive targets are accepted upstream, so the divisor is guarded
/// here: progress against them reads as 0%.
pub fn monthly_percentage(minutes: u64, target_minutes: i64) -> f64 {
    if target_minutes <= 0 {
        return 0.0;
    }
    (minutes as f64 / target_minutes as f64 * 100.0).min(100.0)
}

/// Maintains the per-user cumulative row.
pub struct ProgressAggregator {
    store: Arc<dyn GrowthStore>,
}

impl ProgressAggregator {
    pub fn new(store: Arc<dyn GrowthStore>) -> Self {
        Self { store }
    }

    /// Record `minutes` against `user_id` as of `today`.
    ///
    /// Fetch, fold, write-if-unchanged. A concurrent writer costs one
    /// re-fetch per collision; anything else propagates unchanged.
    pub async fn record_minutes(
        &self,
        user_id: Uuid,
        minutes: u64,
        today: NaiveDate,
    ) -> Result<CumulativeProgress, CoreError> {
        let mut attempt = 0;
        loop {
            let prior = self.store.cumulative(user_id).await?;
            let next = fold(user_id, prior.as_ref(), minutes, today);
            let written = match &prior {
                None => self.store.insert_cumulative(&next).await,
                Some(row) => self.store.update_cumulative(&next, row.version).await,
            };
            match written {
                Ok(()) => return Ok(next),
                Err(StoreError::Conflict) if attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    warn!(%user_id, attempt, "cumulative write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Current-month minutes for display, 0 when no row exists or the row's
    /// month is already over.
    pub async fn month_minutes(&self, user_id: Uuid, today: NaiveDate) -> Result<u64, CoreError> {
        let row = self.store.cumulative(user_id).await?;
        Ok(row.map(|r| r.month_minutes_as_of(today)).unwrap_or(0))
    }
}
