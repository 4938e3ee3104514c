//! Consecutive-day engagement streaks.
//!
//! A streak counts consecutive calendar days containing at least one
//! session, measured backward from today. Multiple sessions on one day
//! count that day once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::ReadingSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Length of the unbroken run ending today (or yesterday).
    pub current: u32,
    /// Longest run anywhere in the history.
    pub best: u32,
}

/// Derive streaks from a user's session log.
///
/// `current` walks distinct session days backward from `today`: the run
/// starts if the newest day is today or yesterday, extends while each prior
/// day is exactly one day earlier, and halts at the first gap. `best` is
/// the longest consecutive run across the whole history, which can exceed
/// `current` when an older run was longer.
pub fn compute_streaks(sessions: &[ReadingSession], today: NaiveDate) -> StreakSummary {
    let mut days: Vec<NaiveDate> = sessions
        .iter()
        .map(|s| s.started_at.date_naive())
        .collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    if days.is_empty() {
        return StreakSummary { current: 0, best: 0 };
    }

    // Current run: newest day must touch today or yesterday.
    let mut current = 0u32;
    if today - days[0] <= chrono::Duration::days(1) {
        current = 1;
        let mut cursor = days[0];
        for &day in &days[1..] {
            if cursor - day == chrono::Duration::days(1) {
                current += 1;
                cursor = day;
            } else {
                break;
            }
        }
    }

    // Best run over the full history.
    let mut best = 1u32;
    let mut run = 1u32;
    for pair in days.windows(2) {
        if pair[0] - pair[1] == chrono::Duration::days(1) {
            run += 1;
            best = best.max(run);
        } else {
            run = 1;
        }
    }

    StreakSummary {
        current,
        best: best.max(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Utc};
    use uuid::Uuid;

    use crate::session::ActivityKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session_on(day: NaiveDate, hour: u32) -> ReadingSession {
        let started_at = Utc
            .with_ymd_and_hms(day.year(), day.month(), day.day(), hour, 0, 0)
            .unwrap();
        ReadingSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: ActivityKind::Bible,
            book: Some("John".into()),
            chapter: Some(1),
            started_at,
            ended_at: Some(started_at),
            duration_seconds: 600,
        }
    }

    #[test]
    fn empty_history_is_zero_zero() {
        let summary = compute_streaks(&[], date(2026, 8, 7));
        assert_eq!(summary, StreakSummary { current: 0, best: 0 });
    }

    #[test]
    fn today_and_yesterday_make_two() {
        let today = date(2026, 8, 7);
        let sessions = vec![session_on(today, 9), session_on(date(2026, 8, 6), 21)];
        let summary = compute_streaks(&sessions, today);
        assert_eq!(summary.current, 2);
        assert_eq!(summary.best, 2);
    }

    #[test]
    fn gap_halts_the_current_walk() {
        let today = date(2026, 8, 7);
        let sessions = vec![session_on(today, 9), session_on(date(2026, 8, 4), 9)];
        let summary = compute_streaks(&sessions, today);
        assert_eq!(summary.current, 1);
    }

    #[test]
    fn same_day_sessions_count_once() {
        let today = date(2026, 8, 7);
        let sessions = vec![
            session_on(today, 7),
            session_on(today, 12),
            session_on(today, 22),
        ];
        let summary = compute_streaks(&sessions, today);
        assert_eq!(summary, StreakSummary { current: 1, best: 1 });
    }

    #[test]
    fn run_ending_yesterday_still_counts() {
        let today = date(2026, 8, 7);
        let sessions = vec![session_on(date(2026, 8, 6), 9), session_on(date(2026, 8, 5), 9)];
        let summary = compute_streaks(&sessions, today);
        assert_eq!(summary.current, 2);
    }

    #[test]
    fn run_ending_before_yesterday_does_not() {
        let today = date(2026, 8, 7);
        let sessions = vec![session_on(date(2026, 8, 5), 9), session_on(date(2026, 8, 4), 9)];
        let summary = compute_streaks(&sessions, today);
        assert_eq!(summary.current, 0);
        assert_eq!(summary.best, 2);
    }

    #[test]
    fn best_covers_older_longer_runs() {
        let today = date(2026, 8, 7);
        // Current run: today only. Older run: four consecutive days.
        let sessions = vec![
            session_on(today, 9),
            session_on(date(2026, 7, 20), 9),
            session_on(date(2026, 7, 19), 9),
            session_on(date(2026, 7, 18), 9),
            session_on(date(2026, 7, 17), 9),
        ];
        let summary = compute_streaks(&sessions, today);
        assert_eq!(summary.current, 1);
        assert_eq!(summary.best, 4);
    }

    #[test]
    fn unsorted_input_is_handled() {
        let today = date(2026, 8, 7);
        let sessions = vec![
            session_on(date(2026, 8, 5), 9),
            session_on(today, 9),
            session_on(date(2026, 8, 6), 9),
        ];
        let summary = compute_streaks(&sessions, today);
        assert_eq!(summary.current, 3);
    }
}
