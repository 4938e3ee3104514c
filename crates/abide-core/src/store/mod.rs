//! Persistence boundary.
//!
//! The hosted relational backend is modelled at its interface: the
//! [`GrowthStore`] trait is everything the core asks of it, and the change
//! feed it exposes is the only push channel back. [`sqlite::SqliteStore`]
//! is the bundled adapter; swapping the backend means implementing the
//! trait, nothing in the core changes.

pub mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::feed::ChangeFeed;
use crate::progress::CumulativeProgress;
use crate::session::{ChapterProgress, ReadingSession};

use std::path::PathBuf;

/// Store operations the subsystem depends on. All writes publish a change
/// on the store's feed after commit.
#[async_trait]
pub trait GrowthStore: Send + Sync {
    /// The change feed fed by this store's writes.
    fn feed(&self) -> ChangeFeed;

    // --- Session log ---

    /// Insert an open session row (`ended_at` unset, zero duration).
    async fn insert_session(&self, session: &ReadingSession) -> Result<(), StoreError>;

    /// Close a session with its final duration and end time.
    ///
    /// Closing an already-closed row is a no-op (update-where semantics);
    /// a row that does not exist is [`StoreError::RowMissing`].
    async fn finalize_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
        duration_seconds: u64,
    ) -> Result<(), StoreError>;

    /// All of a user's sessions, newest first.
    async fn sessions_for_user(&self, user_id: Uuid) -> Result<Vec<ReadingSession>, StoreError>;

    /// Sum of finalized seconds with `ended_at` in `[from, to)`.
    async fn finalized_seconds_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    // --- Chapter progress ---

    /// Add minutes to the (user, book, chapter) row, creating it if absent.
    async fn add_chapter_minutes(
        &self,
        user_id: Uuid,
        book: &str,
        chapter: u32,
        minutes: u64,
    ) -> Result<(), StoreError>;

    /// Mark a chapter complete, creating the row if absent.
    async fn mark_chapter_complete(
        &self,
        user_id: Uuid,
        book: &str,
        chapter: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn chapter_progress(
        &self,
        user_id: Uuid,
        book: &str,
        chapter: u32,
    ) -> Result<Option<ChapterProgress>, StoreError>;

    // --- Cumulative progress ---

    async fn cumulative(&self, user_id: Uuid) -> Result<Option<CumulativeProgress>, StoreError>;

    /// First write of a user's cumulative row. A concurrent first write
    /// surfaces as [`StoreError::Conflict`] for the loser.
    async fn insert_cumulative(&self, row: &CumulativeProgress) -> Result<(), StoreError>;

    /// Conditional write: succeeds only while the stored version still
    /// equals `expected_version`, otherwise [`StoreError::Conflict`].
    async fn update_cumulative(
        &self,
        row: &CumulativeProgress,
        expected_version: i64,
    ) -> Result<(), StoreError>;

    // --- Goals ---

    async fn goal(&self, user_id: Uuid, month: NaiveDate) -> Result<Option<i64>, StoreError>;

    async fn set_goal(
        &self,
        user_id: Uuid,
        month: NaiveDate,
        target_minutes: i64,
    ) -> Result<(), StoreError>;
}

/// Returns `~/.config/abide[-dev]/` based on ABIDE_ENV.
///
/// Set ABIDE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ABIDE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("abide-dev")
    } else {
        base_dir.join("abide")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
