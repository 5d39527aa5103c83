//! Work-session model: the raw material for profile learning and pattern analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    /// A normal focused block (pomodoro-style).
    Work,
    /// An open-ended block without a fixed end.
    Continuous,
    ShortBreak,
    LongBreak,
}

impl SessionKind {
    /// Only these kinds carry productivity signal worth learning from.
    pub fn is_learnable(&self) -> bool {
        matches!(self, SessionKind::Work | SessionKind::Continuous)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSession {
    pub id: String,
    pub user_id: String,
    pub kind: SessionKind,

    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,

    /// Minutes, when the tracker recorded one.
    pub duration_minutes: Option<i32>,

    pub pause_count: i32,

    /// Seconds actually spent working vs. paused inside the session.
    pub active_seconds: i64,
    pub paused_seconds: i64,

    /// True when the user ended the session normally instead of abandoning it.
    pub completed: bool,
}

impl WorkSession {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, kind: SessionKind, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            kind,
            started_at,
            ended_at: None,
            duration_minutes: None,
            pause_count: 0,
            active_seconds: 0,
            paused_seconds: 0,
            completed: false,
        }
    }

    pub fn with_duration(mut self, minutes: i32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_pauses(mut self, count: i32) -> Self {
        self.pause_count = count;
        self
    }

    pub fn with_active_seconds(mut self, seconds: i64) -> Self {
        self.active_seconds = seconds;
        self
    }

    pub fn with_paused_seconds(mut self, seconds: i64) -> Self {
        self.paused_seconds = seconds;
        self
    }

    pub fn finished(mut self, ended_at: DateTime<Utc>) -> Self {
        self.ended_at = Some(ended_at);
        self.completed = true;
        self
    }

    /// Active time over total tracked time. None when nothing was tracked,
    /// so callers can skip the ratio adjustment instead of inventing one.
    pub fn work_ratio(&self) -> Option<f64> {
        let total = self.active_seconds + self.paused_seconds;
        if total <= 0 {
            return None;
        }
        Some(self.active_seconds as f64 / total as f64)
    }

    /// Minutes since the session started; for live sessions.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_minutes().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_work_ratio() {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let s = WorkSession::new("s1", "u1", SessionKind::Work, start)
            .with_active_seconds(1800)
            .with_paused_seconds(200);
        let ratio = s.work_ratio().unwrap();
        assert!((ratio - 0.9).abs() < 1e-9);

        let untracked = WorkSession::new("s2", "u1", SessionKind::Work, start);
        assert!(untracked.work_ratio().is_none());
    }

    #[test]
    fn test_elapsed_minutes_never_negative() {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let s = WorkSession::new("s1", "u1", SessionKind::Work, start);
        let before = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        assert_eq!(s.elapsed_minutes(before), 0);

        let later = Utc.with_ymd_and_hms(2026, 3, 10, 10, 30, 0).unwrap();
        assert_eq!(s.elapsed_minutes(later), 90);
    }
}
