//! Rest recommendations from live state, plus the intervention policy over
//! burnout risk levels.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::burnout::{BurnoutAnalysis, RiskLevel};
use crate::time::{is_late_night, is_weekend};

/// Active-session minutes at which a break becomes urgent.
const LONG_SESSION_HIGH_MINUTES: i64 = 120;
const LONG_SESSION_MEDIUM_MINUTES: i64 = 90;
/// Daily totals that trigger a stop suggestion.
const DAILY_HOURS_HIGH: f64 = 12.0;
const DAILY_HOURS_MEDIUM: f64 = 10.0;
/// Weekend hours that count as "actually working" rather than a quick check-in.
const WEEKEND_HOURS_THRESHOLD: f64 = 2.0;
/// Open-task counts that read as overload.
const OVERLOAD_URGENT: u32 = 5;
const OVERLOAD_OVERDUE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestPriority {
    High,
    Medium,
    Low,
}

impl RestPriority {
    pub fn weight(self) -> u8 {
        match self {
            RestPriority::High => 3,
            RestPriority::Medium => 2,
            RestPriority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestKind {
    TakeBreak,
    EndOfDay,
    DailyLimit,
    WeekendRest,
    ReduceWorkload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestRecommendation {
    pub kind: RestKind,
    pub priority: RestPriority,
    pub message: String,
}

/// Live inputs for rest advice; everything optional or zeroed on cold start.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RestContext {
    /// Minutes the currently running session has been going, if any.
    pub active_session_minutes: Option<i64>,
    /// Tracked hours so far today.
    pub hours_today: f64,
    pub urgent_count: u32,
    pub overdue_count: u32,
}

/// Assemble recommendations, highest priority first.
pub fn recommend_rest(ctx: &RestContext, tz: Tz, now: DateTime<Utc>) -> Vec<RestRecommendation> {
    let mut out: Vec<RestRecommendation> = Vec::new();

    if let Some(elapsed) = ctx.active_session_minutes {
        if elapsed >= LONG_SESSION_HIGH_MINUTES {
            out.push(RestRecommendation {
                kind: RestKind::TakeBreak,
                priority: RestPriority::High,
                message: format!(
                    "You have been working for {elapsed} minutes straight. Take a real break now."
                ),
            });
        } else if elapsed >= LONG_SESSION_MEDIUM_MINUTES {
            out.push(RestRecommendation {
                kind: RestKind::TakeBreak,
                priority: RestPriority::Medium,
                message: format!("{elapsed} minutes into this session. A short break would help."),
            });
        }
    }

    if is_late_night(now, tz) {
        out.push(RestRecommendation {
            kind: RestKind::EndOfDay,
            priority: RestPriority::High,
            message: "It is late. Wrap up and end the day; tomorrow's focus depends on it.".to_string(),
        });
    }

    if ctx.hours_today >= DAILY_HOURS_HIGH {
        out.push(RestRecommendation {
            kind: RestKind::DailyLimit,
            priority: RestPriority::High,
            message: format!(
                "{:.1} hours today already. Stop here; anything more costs you tomorrow.",
                ctx.hours_today
            ),
        });
    } else if ctx.hours_today >= DAILY_HOURS_MEDIUM {
        out.push(RestRecommendation {
            kind: RestKind::DailyLimit,
            priority: RestPriority::Medium,
            message: format!("{:.1} hours today. Consider winding down soon.", ctx.hours_today),
        });
    }

    if is_weekend(now, tz) && ctx.hours_today >= WEEKEND_HOURS_THRESHOLD {
        out.push(RestRecommendation {
            kind: RestKind::WeekendRest,
            priority: RestPriority::Medium,
            message: "It is the weekend. Give yourself the rest of the day off.".to_string(),
        });
    }

    if ctx.urgent_count > OVERLOAD_URGENT || ctx.overdue_count > OVERLOAD_OVERDUE {
        out.push(RestRecommendation {
            kind: RestKind::ReduceWorkload,
            priority: RestPriority::High,
            message: format!(
                "{} urgent and {} overdue tasks is too much to carry. Reduce the workload before it reduces you.",
                ctx.urgent_count, ctx.overdue_count
            ),
        });
    }

    out.sort_by(|a, b| b.priority.weight().cmp(&a.priority.weight()));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterventionKind {
    CriticalAlert,
    StrongWarning,
    GentleReminder,
}

/// A nudge the host should surface. `notify` distinguishes push-worthy
/// alerts from dashboard-only reminders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub kind: InterventionKind,
    pub notify: bool,
    pub message: String,
}

/// Single-branch policy over the risk level.
pub fn decide_intervention(analysis: &BurnoutAnalysis) -> Option<Intervention> {
    match analysis.risk_level {
        RiskLevel::Critical => Some(Intervention {
            kind: InterventionKind::CriticalAlert,
            notify: true,
            message: format!(
                "Burnout risk is critical (score {:.0}). Stop, rest, and rebuild your schedule before taking on anything new.",
                analysis.risk_score
            ),
        }),
        RiskLevel::High => Some(Intervention {
            kind: InterventionKind::StrongWarning,
            notify: true,
            message: format!(
                "Burnout risk is high (score {:.0}). Cut back this week and protect your recovery time.",
                analysis.risk_score
            ),
        }),
        RiskLevel::Moderate if analysis.warnings.len() >= 2 => Some(Intervention {
            kind: InterventionKind::GentleReminder,
            notify: false,
            message: "A few strain signals are building up. Worth a look at your recent pattern.".to_string(),
        }),
        _ => None,
    }
}
