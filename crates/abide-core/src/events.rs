use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::ActivityKind;

/// Every externally visible state change produces an Event.
/// UI surfaces poll or subscribe; none of these carry authoritative row data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        kind: ActivityKind,
        book: Option<String>,
        chapter: Option<u32>,
        at: DateTime<Utc>,
    },
    /// Fired on every whole-minute tick boundary while a timer runs, so
    /// listeners can show approximate progress before finalization.
    MinuteElapsed {
        minutes: u64,
        at: DateTime<Utc>,
    },
    SessionFinalized {
        session_id: Uuid,
        duration_seconds: u64,
        at: DateTime<Utc>,
    },
}
