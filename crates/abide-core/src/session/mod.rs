//! Session domain types and the session recorder.
//!
//! A session is one timed, bounded interval of a tracked activity: reading a
//! chapter, or prayer. Sessions are the append-mostly log from which every
//! derived statistic (streaks, daily and monthly totals) is recomputed.

mod recorder;

pub use recorder::{SessionHandle, SessionRecorder};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of activity a session tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Prayer,
    Bible,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Prayer => "prayer",
            ActivityKind::Bible => "bible",
        }
    }
}

/// What a timer is pointed at. A bible target must name a book and chapter;
/// prayer needs no passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub kind: ActivityKind,
    pub book: Option<String>,
    pub chapter: Option<u32>,
}

impl Target {
    pub fn prayer() -> Self {
        Self {
            kind: ActivityKind::Prayer,
            book: None,
            chapter: None,
        }
    }

    pub fn chapter(book: impl Into<String>, chapter: u32) -> Self {
        Self {
            kind: ActivityKind::Bible,
            book: Some(book.into()),
            chapter: Some(chapter),
        }
    }

    /// A bible target without a selected book and chapter is incomplete and
    /// must not start a timer.
    pub fn is_complete(&self) -> bool {
        match self.kind {
            ActivityKind::Prayer => true,
            ActivityKind::Bible => {
                self.book.as_deref().is_some_and(|b| !b.is_empty()) && self.chapter.is_some()
            }
        }
    }
}

/// One row of the session log.
///
/// Open while `ended_at` is `None`; mutated exactly once, on stop, to set the
/// final duration and end time. Never deleted by normal flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ActivityKind,
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
}

impl ReadingSession {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Per user x book x chapter reading progress. At most one row per triple;
/// created or updated when a chapter session finalizes or the chapter is
/// explicitly marked complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterProgress {
    pub user_id: Uuid,
    pub book: String,
    pub chapter: u32,
    pub completed: bool,
    pub minutes_spent: u64,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prayer_target_is_complete() {
        assert!(Target::prayer().is_complete());
    }

    #[test]
    fn bible_target_requires_book_and_chapter() {
        assert!(Target::chapter("John", 3).is_complete());

        let no_chapter = Target {
            kind: ActivityKind::Bible,
            book: Some("John".into()),
            chapter: None,
        };
        assert!(!no_chapter.is_complete());

        let empty_book = Target {
            kind: ActivityKind::Bible,
            book: Some(String::new()),
            chapter: Some(3),
        };
        assert!(!empty_book.is_complete());
    }
}
