//! Natural-language task capture: a guarded, schema-strict AI parse with a
//! deterministic heuristic parser behind it.

use cadence_core::task::Priority;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ai::GenerativePort;
use crate::config::ops;
use crate::error::AiError;
use crate::predict::PredictionSource;
use crate::resilience::ResilienceManager;

const DRAFT_MINUTES_MIN: i32 = 5;
const DRAFT_MINUTES_MAX: i32 = 480;
const UNTITLED: &str = "Untitled task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DueDay {
    Today,
    Tomorrow,
}

impl std::fmt::Display for DueDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DueDay::Today => write!(f, "today"),
            DueDay::Tomorrow => write!(f, "tomorrow"),
        }
    }
}

/// What the parser understood from free text. Not yet a stored task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub estimated_minutes: Option<i32>,
    pub due: Option<DueDay>,
    pub source: PredictionSource,
}

/// Parse free text into a task draft. The AI path runs under the
/// `parse_task` circuit; every failure of it (open circuit, transport,
/// timeout, schema violation) falls back to [`heuristic_parse`].
/// `known_categories` are the user's learned category names, passed to the
/// model so the draft lands in their existing taxonomy.
pub async fn parse_task(
    text: &str,
    known_categories: &[String],
    port: Option<&dyn GenerativePort>,
    manager: &ResilienceManager,
) -> TaskDraft {
    let trimmed = text.trim();
    let Some(port) = port else {
        return heuristic_parse(trimmed);
    };
    if trimmed.is_empty() {
        return heuristic_parse(trimmed);
    }

    let context = draft_context(known_categories);
    let prompt = format!("Turn this into a task:\n{trimmed}");
    let outcome = manager
        .guard(ops::PARSE_TASK, || async {
            let raw = port.generate(&context, &prompt).await?;
            parse_ai_draft(&raw)
        })
        .await;

    match outcome {
        Ok(draft) => {
            debug!(title = %draft.title, "AI task draft accepted");
            draft
        }
        Err(err) => {
            warn!(error = %err, "task parse fell back to heuristics");
            heuristic_parse(trimmed)
        }
    }
}

fn draft_context(known_categories: &[String]) -> String {
    let mut context = String::from(
        "You turn one line of free text into a task draft for a productivity tool. \
         Answer with one JSON object, no prose: \
         {\"title\": <string>, \"category\": <string or null>, \
         \"priority\": \"urgent\"|\"high\"|\"medium\"|\"low\" or null, \
         \"estimatedMinutes\": <integer or null>, \"due\": \"today\"|\"tomorrow\" or null}",
    );
    if !known_categories.is_empty() {
        context.push_str("\nPrefer one of the user's existing categories when one fits: ");
        context.push_str(&known_categories.join(", "));
    }
    context
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct AiTaskDraft {
    title: String,
    category: Option<String>,
    priority: Option<String>,
    estimated_minutes: Option<i32>,
    due: Option<String>,
}

/// Strict parse of the model's draft. Any deviation from the schema is an
/// error; the caller falls back to the heuristic parser.
fn parse_ai_draft(raw: &str) -> Result<TaskDraft, AiError> {
    let parsed: AiTaskDraft = serde_json::from_str(raw.trim())
        .map_err(|e| AiError::Response(format!("draft schema: {e}")))?;

    let title = parsed.title.trim().to_string();
    if title.is_empty() {
        return Err(AiError::Response("empty title".to_string()));
    }

    let category = match parsed.category.as_deref().map(str::trim) {
        Some("") => return Err(AiError::Response("empty category".to_string())),
        Some(c) => Some(c.to_lowercase()),
        None => None,
    };

    let priority = match parsed.priority.as_deref() {
        Some(p) => Some(parse_priority(p).ok_or_else(|| {
            AiError::Response(format!("unknown priority: {p}"))
        })?),
        None => None,
    };

    if let Some(minutes) = parsed.estimated_minutes
        && !(DRAFT_MINUTES_MIN..=DRAFT_MINUTES_MAX).contains(&minutes)
    {
        return Err(AiError::Response(format!("estimate out of range: {minutes} minutes")));
    }

    let due = match parsed.due.as_deref() {
        Some("today") => Some(DueDay::Today),
        Some("tomorrow") => Some(DueDay::Tomorrow),
        Some(other) => return Err(AiError::Response(format!("unknown due keyword: {other}"))),
        None => None,
    };

    Ok(TaskDraft {
        title,
        description: None,
        category,
        priority,
        estimated_minutes: parsed.estimated_minutes,
        due,
        source: PredictionSource::Ai,
    })
}

fn parse_priority(label: &str) -> Option<Priority> {
    match label.to_lowercase().as_str() {
        "urgent" => Some(Priority::Urgent),
        "high" => Some(Priority::High),
        "medium" => Some(Priority::Medium),
        "low" => Some(Priority::Low),
        _ => None,
    }
}

// Patterns are static and known-good; a failed build just skips that
// extraction instead of failing the whole (total) parser.
fn pattern(pattern: &str) -> Option<Regex> {
    Regex::new(pattern).ok()
}

/// Deterministic parser for the fallback path. Understands `!urgent`,
/// `!high`, `!low` markers, one `#category` tag, `today`/`tomorrow` words,
/// and `~30m`/`~2h` duration hints. Total over any input.
pub fn heuristic_parse(text: &str) -> TaskDraft {
    let mut working = text.trim().to_string();

    let mut priority = None;
    if let Some(re) = pattern(r"(?i)!(urgent|high|low)\b") {
        if let Some(caps) = re.captures(&working) {
            priority = parse_priority(&caps[1]);
        }
        working = re.replace_all(&working, "").into_owned();
    }

    let mut category = None;
    if let Some(re) = pattern(r"#([A-Za-z][A-Za-z0-9_-]*)") {
        if let Some(caps) = re.captures(&working) {
            category = Some(caps[1].to_lowercase());
        }
        working = re.replace_all(&working, "").into_owned();
    }

    let mut estimated_minutes = None;
    if let Some(re) = pattern(r"(?i)~\s*(\d{1,3})\s*(m|min|mins|h|hr|hrs)\b") {
        if let Some(caps) = re.captures(&working) {
            let amount: i32 = caps[1].parse().unwrap_or(0);
            let minutes = if caps[2].to_lowercase().starts_with('h') { amount * 60 } else { amount };
            if minutes > 0 {
                estimated_minutes = Some(minutes);
            }
        }
        working = re.replace_all(&working, "").into_owned();
    }

    // Due words stay in the title; they read naturally there.
    let due = if pattern(r"(?i)\btomorrow\b").is_some_and(|re| re.is_match(&working)) {
        Some(DueDay::Tomorrow)
    } else if pattern(r"(?i)\btoday\b").is_some_and(|re| re.is_match(&working)) {
        Some(DueDay::Today)
    } else {
        None
    };

    let collapsed = working.split_whitespace().collect::<Vec<_>>().join(" ");
    let (title, description) = match collapsed.split_once(". ") {
        Some((head, rest)) if !head.trim().is_empty() => {
            (head.trim().to_string(), Some(rest.trim().to_string()))
        }
        _ => (collapsed.trim().trim_end_matches('.').to_string(), None),
    };
    let title = if title.is_empty() { UNTITLED.to_string() } else { title };

    TaskDraft {
        title,
        description,
        category,
        priority,
        estimated_minutes,
        due,
        source: PredictionSource::Local,
    }
}
