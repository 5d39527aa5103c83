//! Session learning: fold one completed work session into the profile.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::profile::{ProductivityProfile, SmoothingConfig, ValidationError};
use crate::session::{SessionKind, WorkSession};
use crate::time::{local_hour, local_weekday};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LearnError {
    #[error("session kind {0:?} carries no productivity signal")]
    NotLearnable(SessionKind),
    #[error("session was not completed")]
    NotCompleted,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// How productive the session looks, in [0,1].
///
/// Starts neutral and moves on completion, duration sweet spot, pause churn,
/// and the active/paused ratio. Total over any session shape.
pub fn productivity_sample(session: &WorkSession) -> f64 {
    let mut sample = 0.5;

    if session.completed {
        sample += 0.2;
    }

    if let Some(minutes) = session.duration_minutes {
        if (25..=50).contains(&minutes) {
            sample += 0.2;
        } else if (10..25).contains(&minutes) {
            sample += 0.1;
        } else if minutes > 50 {
            sample += 0.1;
        }
    }

    let pause_penalty = (session.pause_count.max(0) as f64 * 0.05).min(0.3);
    sample -= pause_penalty;

    if let Some(ratio) = session.work_ratio() {
        if ratio >= 0.9 {
            sample += 0.2;
        } else if ratio >= 0.8 {
            sample += 0.15;
        } else if ratio >= 0.7 {
            sample += 0.1;
        } else if ratio < 0.5 {
            sample -= 0.2;
        }
    }

    sample.clamp(0.0, 1.0)
}

/// Apply one completed Work/Continuous session to the profile: the sample
/// lands on the start hour and weekday, and a known duration feeds the
/// average. Returns the updated profile; the input is untouched.
pub fn learn_from_session(
    profile: &ProductivityProfile,
    session: &WorkSession,
    smoothing: &SmoothingConfig,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<ProductivityProfile, LearnError> {
    if !session.kind.is_learnable() {
        return Err(LearnError::NotLearnable(session.kind));
    }
    if !session.completed {
        return Err(LearnError::NotCompleted);
    }

    let sample = productivity_sample(session);
    let hour = local_hour(session.started_at, tz);
    let day = local_weekday(session.started_at, tz);

    let mut updated = profile
        .update_peak_hour(hour, sample, smoothing, now)?
        .update_peak_day(day, sample, smoothing, now)?;

    if let Some(minutes) = session.duration_minutes {
        updated = updated.recalculate_avg_duration(&[minutes], smoothing, now)?;
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_timezone;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 16, 0, 0).unwrap()
    }

    fn work_session(minutes: i32) -> WorkSession {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 15, 30, 0).unwrap();
        WorkSession::new("s1", "u1", SessionKind::Work, start)
            .with_duration(minutes)
            .finished(start + chrono::Duration::minutes(minutes as i64))
    }

    #[test]
    fn test_sample_ideal_session_caps_at_one() {
        let s = work_session(30)
            .with_active_seconds(1710)
            .with_paused_seconds(90);
        // 0.5 + 0.2 completed + 0.2 duration + 0.2 ratio(0.95) = 1.1 -> 1.0
        assert_eq!(productivity_sample(&s), 1.0);
    }

    #[test]
    fn test_sample_pause_penalty_capped() {
        let heavy = work_session(30).with_pauses(10);
        let capped = work_session(30).with_pauses(6);
        // min(10*0.05, 0.3) == min(6*0.05, 0.3) == 0.3
        assert_eq!(productivity_sample(&heavy), productivity_sample(&capped));
    }

    #[test]
    fn test_sample_low_work_ratio_penalized() {
        let s = work_session(30)
            .with_active_seconds(400)
            .with_paused_seconds(600);
        // 0.5 + 0.2 + 0.2 - 0.2 (ratio 0.4) = 0.7
        assert!((productivity_sample(&s) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_sample_short_session_no_duration_bonus() {
        let s = work_session(5);
        // 0.5 + 0.2 completed only
        assert!((productivity_sample(&s) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_learn_rejects_breaks_and_incomplete() {
        let profile = ProductivityProfile::new("u1", now());
        let smoothing = SmoothingConfig::default();
        let tz = parse_timezone("UTC").unwrap();

        let start = Utc.with_ymd_and_hms(2026, 3, 10, 15, 30, 0).unwrap();
        let brk = WorkSession::new("b1", "u1", SessionKind::ShortBreak, start)
            .finished(start + chrono::Duration::minutes(10));
        assert_eq!(
            learn_from_session(&profile, &brk, &smoothing, tz, now()),
            Err(LearnError::NotLearnable(SessionKind::ShortBreak))
        );

        let abandoned = WorkSession::new("a1", "u1", SessionKind::Work, start).with_duration(30);
        assert_eq!(
            learn_from_session(&profile, &abandoned, &smoothing, tz, now()),
            Err(LearnError::NotCompleted)
        );
    }

    #[test]
    fn test_learn_updates_local_hour_and_day() {
        let profile = ProductivityProfile::new("u1", now());
        let smoothing = SmoothingConfig::default();
        // 15:30 UTC on 2026-03-10 is 10:30 Tuesday in Chicago (CDT).
        let tz = parse_timezone("America/Chicago").unwrap();
        let s = work_session(45);

        let updated = learn_from_session(&profile, &s, &smoothing, tz, now()).unwrap();

        // sample: 0.5 + 0.2 completed + 0.2 duration = 0.9
        // hour 10: 0.5*0.7 + 0.9*0.3 = 0.62
        assert!((updated.peak_hour_score(10) - 0.62).abs() < 1e-9);
        // Tuesday = day 2
        assert!((updated.peak_day_score(2) - 0.62).abs() < 1e-9);
        // untouched hours stay neutral
        assert_eq!(updated.peak_hour_score(15), 0.5);
        // avg duration: 30*0.6 + 45*0.4 = 36
        assert!((updated.avg_task_duration - 36.0).abs() < 1e-9);
    }
}
