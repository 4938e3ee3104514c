//! Session persistence: the open row on start, the single mutation on stop.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::session::{ActivityKind, ReadingSession, Target};
use crate::store::GrowthStore;

/// Proof of an open session.
///
/// Deliberately neither `Clone` nor `Copy`: [`SessionRecorder::finish`]
/// consumes the handle, so a session cannot be finalized twice from the
/// same handle.
#[derive(Debug)]
pub struct SessionHandle {
    session_id: Uuid,
    user_id: Uuid,
    target: Target,
}

impl SessionHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

/// Writes the session log.
pub struct SessionRecorder {
    store: Arc<dyn GrowthStore>,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn GrowthStore>) -> Self {
        Self { store }
    }

    /// Insert an open session row for `target`.
    ///
    /// On a store failure nothing is returned, so the caller's timer never
    /// starts counting against a session that was not recorded.
    pub async fn start(&self, user_id: Uuid, target: Target) -> Result<SessionHandle, CoreError> {
        let session = ReadingSession {
            id: Uuid::new_v4(),
            user_id,
            kind: target.kind,
            book: target.book.clone(),
            chapter: target.chapter,
            started_at: Utc::now(),
            ended_at: None,
            duration_seconds: 0,
        };
        self.store.insert_session(&session).await?;
        debug!(session_id = %session.id, kind = target.kind.as_str(), "session started");
        Ok(SessionHandle {
            session_id: session.id,
            user_id,
            target,
        })
    }

    /// Close the session with its final duration, consuming the handle.
    ///
    /// A finalized bible session also adds its whole minutes to the
    /// chapter's progress row.
    pub async fn finish(
        &self,
        handle: SessionHandle,
        duration_seconds: u64,
    ) -> Result<(), CoreError> {
        self.store
            .finalize_session(handle.user_id, handle.session_id, Utc::now(), duration_seconds)
            .await?;
        debug!(session_id = %handle.session_id, duration_seconds, "session finalized");

        if handle.target.kind == ActivityKind::Bible {
            if let (Some(book), Some(chapter)) = (&handle.target.book, handle.target.chapter) {
                self.store
                    .add_chapter_minutes(handle.user_id, book, chapter, duration_seconds / 60)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    #[tokio::test]
    async fn start_inserts_open_row() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let recorder = SessionRecorder::new(store.clone());
        let user = Uuid::new_v4();

        let handle = recorder.start(user, Target::chapter("John", 3)).await.unwrap();
        let rows = store.sessions_for_user(user).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, handle.session_id());
        assert!(rows[0].is_open());
        assert_eq!(rows[0].duration_seconds, 0);
    }

    #[tokio::test]
    async fn finish_closes_row_and_credits_chapter() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let recorder = SessionRecorder::new(store.clone());
        let user = Uuid::new_v4();

        let handle = recorder.start(user, Target::chapter("John", 3)).await.unwrap();
        recorder.finish(handle, 725).await.unwrap();

        let rows = store.sessions_for_user(user).await.unwrap();
        assert!(!rows[0].is_open());
        assert_eq!(rows[0].duration_seconds, 725);

        let progress = store.chapter_progress(user, "John", 3).await.unwrap().unwrap();
        assert_eq!(progress.minutes_spent, 12);
        assert!(!progress.completed);
    }

    #[tokio::test]
    async fn prayer_finish_leaves_chapter_progress_alone() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let recorder = SessionRecorder::new(store.clone());
        let user = Uuid::new_v4();

        let handle = recorder.start(user, Target::prayer()).await.unwrap();
        recorder.finish(handle, 300).await.unwrap();

        assert!(store
            .chapter_progress(user, "John", 3)
            .await
            .unwrap()
            .is_none());
    }
}
