//! Burnout risk scoring: threshold warnings over a pattern snapshot, a
//! bounded risk score, and a coarse level for alerting.

use serde::{Deserialize, Serialize};

use crate::patterns::{CompletionTrend, WorkPatternSnapshot};

/// Scores at or above this are worth an AI-written insight.
pub const AI_INSIGHT_MIN_SCORE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    fn score_bonus(self) -> f64 {
        match self {
            Severity::Severe => 10.0,
            Severity::Moderate => 5.0,
            Severity::Mild => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    LateNights,
    WeekendWork,
    NoBreaks,
    LongHours,
    TaskOverload,
    DecliningCompletion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            RiskLevel::Critical
        } else if score >= 50.0 {
            RiskLevel::High
        } else if score >= 30.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }
}

/// Full analysis result. `ai_insight` stays None unless the service layer
/// fetched one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnoutAnalysis {
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub snapshot: WorkPatternSnapshot,
    pub warnings: Vec<Warning>,
    pub ai_insight: Option<String>,
}

impl BurnoutAnalysis {
    /// Purely local analysis: warnings, score, level. No AI involved.
    pub fn local(snapshot: WorkPatternSnapshot) -> Self {
        let warnings = collect_warnings(&snapshot);
        let risk_score = risk_score(&snapshot, &warnings);
        Self {
            risk_level: RiskLevel::from_score(risk_score),
            risk_score,
            snapshot,
            warnings,
            ai_insight: None,
        }
    }
}

fn warning(kind: WarningKind, severity: Severity, message: String, recommendation: &str) -> Warning {
    Warning {
        kind,
        severity,
        message,
        recommendation: recommendation.to_string(),
    }
}

/// Classify each threshold breach in the snapshot into a warning.
pub fn collect_warnings(snapshot: &WorkPatternSnapshot) -> Vec<Warning> {
    let mut out = Vec::new();

    let late = snapshot.late_night_percentage;
    if late > 5.0 {
        let severity = if late > 30.0 {
            Severity::Severe
        } else if late > 15.0 {
            Severity::Moderate
        } else {
            Severity::Mild
        };
        out.push(warning(
            WarningKind::LateNights,
            severity,
            format!(
                "{:.0}% of your work time falls between 22:00 and 06:00 ({} day(s) this period)",
                late, snapshot.late_night_days
            ),
            "Move demanding work earlier in the day and protect your sleep window.",
        ));
    }

    let weekend = snapshot.weekend_percentage;
    if weekend > 10.0 {
        let severity = if weekend > 40.0 {
            Severity::Severe
        } else if weekend > 25.0 {
            Severity::Moderate
        } else {
            Severity::Mild
        };
        out.push(warning(
            WarningKind::WeekendWork,
            severity,
            format!(
                "{:.0}% of your work time lands on weekends ({} day(s))",
                weekend, snapshot.weekend_days
            ),
            "Keep at least one weekend day completely work-free.",
        ));
    }

    let longest = snapshot.longest_session_minutes;
    if longest > 120 {
        let severity = if longest > 180 { Severity::Severe } else { Severity::Moderate };
        out.push(warning(
            WarningKind::NoBreaks,
            severity,
            format!("Your longest uninterrupted session ran {} minutes", longest),
            "Break long stretches with a short pause every 60-90 minutes.",
        ));
    }

    let daily = snapshot.avg_daily_hours;
    if daily > 10.0 {
        let severity = if daily > 12.0 { Severity::Severe } else { Severity::Moderate };
        out.push(warning(
            WarningKind::LongHours,
            severity,
            format!("You average {:.1} hours of tracked work per working day", daily),
            "Set a hard stop time and defer what does not fit the day.",
        ));
    }

    let urgent = snapshot.urgent_count;
    let overdue = snapshot.overdue_count;
    if urgent > 5 || overdue > 3 {
        let severity = if urgent > 8 || overdue > 5 { Severity::Severe } else { Severity::Moderate };
        out.push(warning(
            WarningKind::TaskOverload,
            severity,
            format!("{} urgent and {} overdue tasks are waiting on you", urgent, overdue),
            "Triage the backlog: delegate, reschedule, or drop what you can.",
        ));
    }

    if snapshot.completion_trend == CompletionTrend::Declining {
        let severity = if snapshot.recent_completion_rate < 0.5 {
            Severity::Severe
        } else {
            Severity::Moderate
        };
        out.push(warning(
            WarningKind::DecliningCompletion,
            severity,
            format!(
                "Your completion rate is slipping (currently {:.0}%)",
                snapshot.recent_completion_rate * 100.0
            ),
            "Plan fewer, smaller tasks until your completion rate recovers.",
        ));
    }

    out
}

/// Bounded risk score: capped contributions per signal, plus per-warning
/// bonuses and a declining-trend penalty, clamped to [0,100].
pub fn risk_score(snapshot: &WorkPatternSnapshot, warnings: &[Warning]) -> f64 {
    let mut score = 0.0;

    score += (snapshot.late_night_percentage * 1.5).min(25.0);
    score += (snapshot.weekend_percentage * 0.8).min(20.0);
    score += ((snapshot.avg_daily_hours - 8.0) * 5.0).clamp(0.0, 15.0);
    score += (snapshot.urgent_count as f64 * 2.0).min(10.0);
    score += (snapshot.overdue_count as f64 * 3.0).min(10.0);

    for w in warnings {
        score += w.severity.score_bonus();
    }

    if snapshot.completion_trend == CompletionTrend::Declining {
        score += 10.0;
    }

    score.clamp(0.0, 100.0)
}
