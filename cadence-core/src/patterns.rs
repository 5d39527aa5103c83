//! Work-pattern analysis: a windowed statistical snapshot of recent sessions
//! and task activity. Pure and total; empty inputs yield a zeroed snapshot.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::session::{SessionKind, WorkSession};
use crate::time::{is_late_night, is_weekend, local_date};

/// Trailing window the analyzer looks at.
pub const DEFAULT_PATTERN_WINDOW_DAYS: i64 = 14;

/// Relative change in task creation that flips the load trend.
const LOAD_TREND_THRESHOLD: f64 = 0.2;
/// Absolute change in completion rate that flips the completion trend.
const COMPLETION_TREND_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskLoadTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionTrend {
    Improving,
    Declining,
    Stable,
}

/// Read-only task counts supplied by the host's task store.
///
/// "Last" and "prior" are the two adjacent 7-day halves used for trend
/// detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskActivity {
    pub urgent_open: u32,
    pub overdue_open: u32,
    pub created_last_week: u32,
    pub created_prior_week: u32,
    pub completed_last_week: u32,
    pub completed_prior_week: u32,
}

/// One analysis call's output. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkPatternSnapshot {
    /// Share of tracked minutes inside the late-night window, 0-100.
    pub late_night_percentage: f64,
    /// Distinct local calendar days with a late-night session start.
    pub late_night_days: u32,
    /// Share of tracked minutes on weekends, 0-100.
    pub weekend_percentage: f64,
    pub weekend_days: u32,
    pub avg_session_minutes: f64,
    pub longest_session_minutes: i32,
    /// Mean of per-day tracked hours over days that had any work.
    pub avg_daily_hours: f64,
    pub urgent_count: u32,
    pub overdue_count: u32,
    pub task_load_trend: TaskLoadTrend,
    pub completion_trend: CompletionTrend,
    /// Completion rate over the most recent 7 days.
    pub recent_completion_rate: f64,
    pub total_sessions: u32,
}

impl Default for WorkPatternSnapshot {
    fn default() -> Self {
        Self::empty(&TaskActivity::default())
    }
}

impl WorkPatternSnapshot {
    fn empty(activity: &TaskActivity) -> Self {
        let (completion_trend, recent_completion_rate) = completion_trend(activity);
        Self {
            late_night_percentage: 0.0,
            late_night_days: 0,
            weekend_percentage: 0.0,
            weekend_days: 0,
            avg_session_minutes: 0.0,
            longest_session_minutes: 0,
            avg_daily_hours: 0.0,
            urgent_count: activity.urgent_open,
            overdue_count: activity.overdue_open,
            task_load_trend: task_load_trend(activity),
            completion_trend,
            recent_completion_rate,
            total_sessions: 0,
        }
    }
}

fn task_load_trend(activity: &TaskActivity) -> TaskLoadTrend {
    let recent = activity.created_last_week as f64;
    let prior = activity.created_prior_week as f64;

    if prior == 0.0 {
        return if recent > 0.0 { TaskLoadTrend::Increasing } else { TaskLoadTrend::Stable };
    }

    let change = (recent - prior) / prior;
    if change > LOAD_TREND_THRESHOLD {
        TaskLoadTrend::Increasing
    } else if change < -LOAD_TREND_THRESHOLD {
        TaskLoadTrend::Decreasing
    } else {
        TaskLoadTrend::Stable
    }
}

fn completion_trend(activity: &TaskActivity) -> (CompletionTrend, f64) {
    let rate = |completed: u32, created: u32| {
        if created == 0 { 0.0 } else { completed as f64 / created as f64 }
    };

    let recent = rate(activity.completed_last_week, activity.created_last_week);
    let prior = rate(activity.completed_prior_week, activity.created_prior_week);

    let diff = recent - prior;
    let trend = if diff > COMPLETION_TREND_THRESHOLD {
        CompletionTrend::Improving
    } else if diff < -COMPLETION_TREND_THRESHOLD {
        CompletionTrend::Declining
    } else {
        CompletionTrend::Stable
    };
    (trend, recent)
}

/// Analyze Work sessions with a known duration inside the trailing window.
///
/// Percentages are shares of tracked minutes, so one long late-night session
/// weighs more than several short daytime ones.
pub fn analyze_patterns(
    sessions: &[WorkSession],
    activity: &TaskActivity,
    window_days: i64,
    tz: Tz,
    now: DateTime<Utc>,
) -> WorkPatternSnapshot {
    let window_start = now - Duration::days(window_days);

    let mut total_minutes: i64 = 0;
    let mut late_minutes: i64 = 0;
    let mut weekend_minutes: i64 = 0;
    let mut longest: i32 = 0;
    let mut count: u32 = 0;

    let mut late_days: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut weekend_days: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut minutes_by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();

    for session in sessions {
        if session.kind != SessionKind::Work {
            continue;
        }
        let Some(minutes) = session.duration_minutes else {
            continue;
        };
        if session.started_at < window_start || session.started_at > now {
            continue;
        }

        let minutes_i64 = minutes as i64;
        let day = local_date(session.started_at, tz);

        total_minutes += minutes_i64;
        count += 1;
        longest = longest.max(minutes);
        *minutes_by_day.entry(day).or_insert(0) += minutes_i64;

        if is_late_night(session.started_at, tz) {
            late_minutes += minutes_i64;
            late_days.insert(day);
        }
        if is_weekend(session.started_at, tz) {
            weekend_minutes += minutes_i64;
            weekend_days.insert(day);
        }
    }

    if count == 0 {
        return WorkPatternSnapshot::empty(activity);
    }

    let avg_session_minutes = total_minutes as f64 / count as f64;
    let avg_daily_hours = minutes_by_day.values().map(|m| *m as f64 / 60.0).sum::<f64>()
        / minutes_by_day.len() as f64;

    let (completion_trend, recent_completion_rate) = completion_trend(activity);

    WorkPatternSnapshot {
        late_night_percentage: late_minutes as f64 / total_minutes as f64 * 100.0,
        late_night_days: late_days.len() as u32,
        weekend_percentage: weekend_minutes as f64 / total_minutes as f64 * 100.0,
        weekend_days: weekend_days.len() as u32,
        avg_session_minutes,
        longest_session_minutes: longest,
        avg_daily_hours,
        urgent_count: activity.urgent_open,
        overdue_count: activity.overdue_open,
        task_load_trend: task_load_trend(activity),
        completion_trend,
        recent_completion_rate,
        total_sessions: count,
    }
}
