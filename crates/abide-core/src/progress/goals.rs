//! Per-user, per-month reading goals.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::CoreError;
use crate::progress::month_start;
use crate::store::GrowthStore;

/// Target applied when a user never set one for the month.
pub const DEFAULT_TARGET_MINUTES: i64 = 30;

/// Goal reads and writes, keyed on (user, first-of-month).
pub struct Goals {
    store: Arc<dyn GrowthStore>,
}

impl Goals {
    pub fn new(store: Arc<dyn GrowthStore>) -> Self {
        Self { store }
    }

    /// The target for the month containing `date`, defaulting to
    /// [`DEFAULT_TARGET_MINUTES`]. No validation beyond the percentage
    /// guard downstream; zero and negative targets are stored as given.
    pub async fn goal(&self, user_id: Uuid, date: NaiveDate) -> Result<i64, CoreError> {
        let stored = self.store.goal(user_id, month_start(date)).await?;
        Ok(stored.unwrap_or(DEFAULT_TARGET_MINUTES))
    }

    /// Upsert the target for the month containing `date`.
    pub async fn set_goal(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        target_minutes: i64,
    ) -> Result<(), CoreError> {
        self.store
            .set_goal(user_id, month_start(date), target_minutes)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn absent_goal_defaults_to_thirty() {
        let goals = Goals::new(Arc::new(SqliteStore::open_memory().unwrap()));
        let user = Uuid::new_v4();
        assert_eq!(goals.goal(user, date(2026, 8, 7)).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn goal_is_keyed_on_month_not_day() {
        let goals = Goals::new(Arc::new(SqliteStore::open_memory().unwrap()));
        let user = Uuid::new_v4();
        goals.set_goal(user, date(2026, 8, 19), 90).await.unwrap();
        assert_eq!(goals.goal(user, date(2026, 8, 2)).await.unwrap(), 90);
        // A different month keeps its own target.
        assert_eq!(goals.goal(user, date(2026, 9, 2)).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn zero_goal_is_stored_as_given() {
        let goals = Goals::new(Arc::new(SqliteStore::open_memory().unwrap()));
        let user = Uuid::new_v4();
        goals.set_goal(user, date(2026, 8, 1), 0).await.unwrap();
        assert_eq!(goals.goal(user, date(2026, 8, 15)).await.unwrap(), 0);
    }
}
