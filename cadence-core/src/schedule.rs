//! Schedule suggestions and local duration estimates over the learned profile.
//!
//! Deterministic-first: everything here is cheap and synchronous. The service
//! layer escalates to the AI backend only when local confidence is too low.

use serde::{Deserialize, Serialize};

use crate::profile::{PEAK_SCORE_THRESHOLD, ProductivityProfile};
use crate::task::Priority;
use crate::time::day_name;

/// Peak entries with scores above this get the softer "tends to go well"
/// phrasing instead of a confident claim.
const SOFT_PEAK_THRESHOLD: f64 = 0.5;

const COMPLEXITY_KEYWORDS: &[&str] = &["refactor", "redesign", "architecture", "migration"];
const DEBUGGING_KEYWORDS: &[&str] = &["fix", "bug", "issue", "debug"];
const SIMPLICITY_KEYWORDS: &[&str] = &["simple", "quick", "minor", "small"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Free-form description of a task that may not exist yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskOutline {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskOutline {
    pub fn has_any_signal(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.category.is_some()
            || self.priority.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationEstimate {
    /// Minutes, rounded to the nearest 5, never below 10.
    pub minutes: i32,
    pub confidence: Confidence,
}

/// Ranked peaks plus a composed recommendation string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalSchedule {
    pub peak_hours: Vec<(u32, f64)>,
    pub peak_days: Vec<(u32, f64)>,
    /// Minutes; the profile's smoothed average, rounded.
    pub suggested_session_minutes: i32,
    pub recommendation: String,
}

/// Compose the schedule view. A missing profile yields the cold-start
/// message rather than an error.
pub fn build_optimal_schedule(profile: Option<&ProductivityProfile>, top_n: usize) -> OptimalSchedule {
    let Some(profile) = profile else {
        return OptimalSchedule {
            peak_hours: Vec::new(),
            peak_days: Vec::new(),
            suggested_session_minutes: 30,
            recommendation:
                "Not enough data yet. Start tracking work sessions to get personalized schedule suggestions."
                    .to_string(),
        };
    };

    let peak_hours = profile.top_peak_hours(top_n);
    let peak_days = profile.top_peak_days(3);

    let mut parts: Vec<String> = Vec::new();

    match peak_hours.first() {
        Some((hour, score)) if *score > PEAK_SCORE_THRESHOLD => {
            parts.push(format!("Your focus is strongest around {hour:02}:00."));
        }
        Some((hour, score)) if *score > SOFT_PEAK_THRESHOLD => {
            parts.push(format!("Work tends to go well for you around {hour:02}:00."));
        }
        _ => {}
    }

    match peak_days.first() {
        Some((day, score)) if *score > PEAK_SCORE_THRESHOLD => {
            parts.push(format!("{}s are your most productive days.", day_name(*day)));
        }
        Some((day, score)) if *score > SOFT_PEAK_THRESHOLD => {
            parts.push(format!("{}s usually work out well for you.", day_name(*day)));
        }
        _ => {}
    }

    let suggested = round_to_nearest_5(profile.avg_task_duration).max(10);
    parts.push(format!("Plan focused blocks of about {suggested} minutes."));

    if profile.completion_rate >= 0.8 {
        parts.push(format!(
            "You complete {:.0}% of what you plan, so keep the current pace.",
            profile.completion_rate * 100.0
        ));
    } else if profile.completion_rate < 0.5 {
        parts.push(
            "You finish under half of what you plan; try scheduling fewer or smaller tasks.".to_string(),
        );
    }

    OptimalSchedule {
        peak_hours,
        peak_days,
        suggested_session_minutes: suggested,
        recommendation: parts.join(" "),
    }
}

/// Local duration estimate: the profile average shaped by category, priority,
/// and keyword multipliers. Total over any input combination.
pub fn estimate_duration(profile: Option<&ProductivityProfile>, outline: &TaskOutline) -> DurationEstimate {
    let (base, mut confidence) = match profile {
        Some(p) => (p.avg_task_duration, Confidence::Medium),
        None => (30.0, Confidence::Low),
    };

    let mut minutes = base;
    let mut strong_category = false;

    if let Some(category) = outline.category.as_deref() {
        let score = profile.map(|p| p.category_score(category)).unwrap_or(0.5);
        if score > 0.7 {
            minutes *= 0.85;
            strong_category = true;
        } else if score < 0.4 {
            minutes *= 1.2;
        }
    }

    match outline.priority {
        Some(Priority::Urgent) => minutes *= 0.9,
        Some(Priority::High) => minutes *= 1.1,
        Some(Priority::Low) => minutes *= 0.85,
        Some(Priority::Medium) | None => {}
    }

    let text = [outline.title.as_deref(), outline.description.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if !text.is_empty() {
        if COMPLEXITY_KEYWORDS.iter().any(|k| text.contains(k)) {
            minutes *= 1.5;
        }
        if DEBUGGING_KEYWORDS.iter().any(|k| text.contains(k)) {
            minutes *= 1.2;
        }
        if SIMPLICITY_KEYWORDS.iter().any(|k| text.contains(k)) {
            minutes *= 0.75;
        }
    }

    if !outline.has_any_signal() {
        confidence = Confidence::Low;
    } else if strong_category && profile.is_some() {
        confidence = Confidence::High;
    }

    DurationEstimate {
        minutes: round_to_nearest_5(minutes).max(10),
        confidence,
    }
}

fn round_to_nearest_5(minutes: f64) -> i32 {
    ((minutes / 5.0).round() as i32) * 5
}
