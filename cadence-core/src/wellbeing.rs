//! Weekly wellbeing summary: a pure aggregation over the trailing week of
//! sessions, task counts, and the burnout analysis.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::burnout::BurnoutAnalysis;
use crate::session::WorkSession;
use crate::time::{is_weekend, local_hour};

const SUMMARY_WINDOW_DAYS: i64 = 7;

/// A gap between sessions counts as a deliberate break only in this band.
/// Shorter is a blip, longer is simply time away.
const BREAK_MIN_MINUTES: i64 = 5;
const BREAK_MAX_MINUTES: i64 = 30;

const STRONG_COMPLETED_TASKS: u32 = 10;
const FOCUS_SWEET_SPOT_MIN: f64 = 25.0;
const FOCUS_SWEET_SPOT_MAX: f64 = 60.0;
const HEALTHY_BREAK_COUNT: u32 = 5;
const LIGHT_WEEKEND_HOURS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub user_id: String,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,

    pub total_hours: f64,
    pub avg_session_minutes: f64,
    pub session_count: u32,
    pub completed_tasks: u32,
    pub breaks_taken: u32,
    /// Local hour of the latest session start this week, if any.
    pub latest_work_hour: Option<u32>,
    pub weekend_hours: f64,

    /// 100 minus the burnout risk score.
    pub overall_score: f64,

    pub highlights: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Build the summary for the seven days ending at `now`. Pure: identical
/// inputs produce identical output, and empty inputs produce a zeroed
/// summary rather than an error.
pub fn summarize_week(
    user_id: &str,
    sessions: &[WorkSession],
    completed_tasks: u32,
    analysis: &BurnoutAnalysis,
    tz: Tz,
    now: DateTime<Utc>,
) -> WeeklySummary {
    let week_start = now - Duration::days(SUMMARY_WINDOW_DAYS);

    let mut counted: Vec<&WorkSession> = sessions
        .iter()
        .filter(|s| s.kind.is_learnable())
        .filter(|s| s.duration_minutes.is_some())
        .filter(|s| s.started_at >= week_start && s.started_at <= now)
        .collect();
    counted.sort_by_key(|s| s.started_at);

    let mut total_minutes: i64 = 0;
    let mut weekend_minutes: i64 = 0;
    let mut latest_work_hour: Option<u32> = None;
    for session in &counted {
        let minutes = i64::from(session.duration_minutes.unwrap_or(0));
        total_minutes += minutes;
        if is_weekend(session.started_at, tz) {
            weekend_minutes += minutes;
        }
        let hour = local_hour(session.started_at, tz);
        latest_work_hour = Some(latest_work_hour.map_or(hour, |h| h.max(hour)));
    }

    let mut breaks_taken: u32 = 0;
    for pair in counted.windows(2) {
        let Some(ended) = pair[0].ended_at else {
            continue;
        };
        let gap = (pair[1].started_at - ended).num_minutes();
        if (BREAK_MIN_MINUTES..=BREAK_MAX_MINUTES).contains(&gap) {
            breaks_taken += 1;
        }
    }

    let session_count = counted.len() as u32;
    let total_hours = total_minutes as f64 / 60.0;
    let weekend_hours = weekend_minutes as f64 / 60.0;
    let avg_session_minutes = if session_count > 0 {
        total_minutes as f64 / f64::from(session_count)
    } else {
        0.0
    };

    let mut highlights = Vec::new();
    if completed_tasks >= STRONG_COMPLETED_TASKS {
        highlights.push(format!("Completed {completed_tasks} tasks this week."));
    }
    if session_count > 0
        && (FOCUS_SWEET_SPOT_MIN..=FOCUS_SWEET_SPOT_MAX).contains(&avg_session_minutes)
    {
        highlights.push(format!(
            "Focus blocks averaged {avg_session_minutes:.0} minutes, a sustainable length."
        ));
    }
    if breaks_taken >= HEALTHY_BREAK_COUNT {
        highlights.push(format!("Took {breaks_taken} real breaks between sessions."));
    }
    if session_count > 0 && weekend_hours < LIGHT_WEEKEND_HOURS {
        highlights.push("Kept the weekend mostly clear of work.".to_string());
    }

    let concerns: Vec<String> = analysis.warnings.iter().map(|w| w.message.clone()).collect();

    let mut recommendations: Vec<String> = Vec::new();
    for warning in &analysis.warnings {
        if !recommendations.contains(&warning.recommendation) {
            recommendations.push(warning.recommendation.clone());
        }
    }
    if session_count >= 3 && breaks_taken < HEALTHY_BREAK_COUNT {
        recommendations.push(format!(
            "Space sessions with breaks of {BREAK_MIN_MINUTES} to {BREAK_MAX_MINUTES} minutes."
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("No major concerns this week. Keep the current rhythm.".to_string());
    }

    WeeklySummary {
        user_id: user_id.to_string(),
        week_start,
        week_end: now,
        total_hours,
        avg_session_minutes,
        session_count,
        completed_tasks,
        breaks_taken,
        latest_work_hour,
        weekend_hours,
        overall_score: (100.0 - analysis.risk_score).clamp(0.0, 100.0),
        highlights,
        concerns,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burnout::BurnoutAnalysis;
    use crate::patterns::{CompletionTrend, TaskLoadTrend, WorkPatternSnapshot};
    use crate::session::SessionKind;
    use crate::time::parse_timezone;
    use chrono::TimeZone;

    fn quiet_snapshot() -> WorkPatternSnapshot {
        WorkPatternSnapshot {
            late_night_percentage: 0.0,
            late_night_days: 0,
            weekend_percentage: 0.0,
            weekend_days: 0,
            avg_session_minutes: 45.0,
            longest_session_minutes: 55,
            avg_daily_hours: 4.0,
            urgent_count: 0,
            overdue_count: 0,
            task_load_trend: TaskLoadTrend::Stable,
            completion_trend: CompletionTrend::Stable,
            recent_completion_rate: 0.8,
            total_sessions: 10,
        }
    }

    fn session(id: &str, start: DateTime<Utc>, minutes: i32) -> WorkSession {
        WorkSession::new(id, "u1", SessionKind::Work, start)
            .with_duration(minutes)
            .finished(start + Duration::minutes(i64::from(minutes)))
    }

    #[test]
    fn test_totals_breaks_and_latest_hour() {
        let tz = parse_timezone("UTC").unwrap();
        // Tuesday 2026-03-10: 9:00-9:50, break 10m, 10:00-10:45, gap 45m, 11:30-12:25.
        let s1 = session("s1", Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(), 50);
        let s2 = session("s2", Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap(), 45);
        let s3 = session("s3", Utc.with_ymd_and_hms(2026, 3, 10, 11, 30, 0).unwrap(), 55);
        let now = Utc.with_ymd_and_hms(2026, 3, 13, 18, 0, 0).unwrap();
        let analysis = BurnoutAnalysis::local(quiet_snapshot());

        let summary = summarize_week("u1", &[s1, s2, s3], 12, &analysis, tz, now);

        assert!((summary.total_hours - 2.5).abs() < 1e-9);
        assert!((summary.avg_session_minutes - 50.0).abs() < 1e-9);
        assert_eq!(summary.session_count, 3);
        assert_eq!(summary.breaks_taken, 1);
        assert_eq!(summary.latest_work_hour, Some(11));
        assert_eq!(summary.weekend_hours, 0.0);
        assert!((summary.overall_score - 100.0).abs() < 1e-9);

        assert!(summary.highlights.iter().any(|h| h.contains("12 tasks")));
        assert!(summary.highlights.iter().any(|h| h.contains("50 minutes")));
        assert!(summary.highlights.iter().any(|h| h.contains("weekend")));
        // One break out of three sessions earns the spacing suggestion.
        assert!(summary.recommendations.iter().any(|r| r.contains("breaks of 5 to 30")));
    }

    #[test]
    fn test_weekend_hours_counted_in_local_time() {
        let tz = parse_timezone("UTC").unwrap();
        // Saturday 2026-03-07 and Sunday 2026-03-08.
        let sat = session("s1", Utc.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap(), 90);
        let sun = session("s2", Utc.with_ymd_and_hms(2026, 3, 8, 15, 0, 0).unwrap(), 60);
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let analysis = BurnoutAnalysis::local(quiet_snapshot());

        let summary = summarize_week("u1", &[sat, sun], 2, &analysis, tz, now);

        assert!((summary.weekend_hours - 2.5).abs() < 1e-9);
        assert!(!summary.highlights.iter().any(|h| h.contains("weekend")));
    }

    #[test]
    fn test_warnings_flow_into_concerns_and_recommendations() {
        let tz = parse_timezone("UTC").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 13, 18, 0, 0).unwrap();
        let mut snapshot = quiet_snapshot();
        snapshot.late_night_percentage = 20.0;
        let analysis = BurnoutAnalysis::local(snapshot);
        assert_eq!(analysis.warnings.len(), 1);

        let summary = summarize_week("u1", &[], 0, &analysis, tz, now);

        assert_eq!(summary.concerns, vec![analysis.warnings[0].message.clone()]);
        assert!(summary.recommendations.contains(&analysis.warnings[0].recommendation));
        assert!((summary.overall_score - (100.0 - analysis.risk_score)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_inputs_zeroed_not_erroring() {
        let tz = parse_timezone("UTC").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 13, 18, 0, 0).unwrap();
        let analysis = BurnoutAnalysis::local(WorkPatternSnapshot::default());

        let summary = summarize_week("u1", &[], 0, &analysis, tz, now);

        assert_eq!(summary.total_hours, 0.0);
        assert_eq!(summary.avg_session_minutes, 0.0);
        assert_eq!(summary.breaks_taken, 0);
        assert_eq!(summary.latest_work_hour, None);
        assert!(summary.highlights.is_empty());
        assert_eq!(
            summary.recommendations,
            vec!["No major concerns this week. Keep the current rhythm.".to_string()]
        );
    }

    #[test]
    fn test_identical_inputs_identical_output() {
        let tz = parse_timezone("UTC").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 13, 18, 0, 0).unwrap();
        let sessions = vec![
            session("s1", Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(), 50),
            session("s2", Utc.with_ymd_and_hms(2026, 3, 11, 9, 0, 0).unwrap(), 40),
        ];
        let analysis = BurnoutAnalysis::local(quiet_snapshot());

        let first = summarize_week("u1", &sessions, 4, &analysis, tz, now);
        let second = summarize_week("u1", &sessions, 4, &analysis, tz, now);
        assert_eq!(first, second);
    }
}
