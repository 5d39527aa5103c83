//! Hybrid duration prediction: local heuristics first, one guarded AI
//! escalation when the local estimate is too weak to trust.

use cadence_core::profile::ProductivityProfile;
use cadence_core::schedule::{Confidence, DurationEstimate, TaskOutline, estimate_duration};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ai::GenerativePort;
use crate::config::ops;
use crate::error::AiError;
use crate::resilience::ResilienceManager;

/// Adopted AI estimates must land in this band; anything else is treated
/// as an unusable response.
const AI_MINUTES_MIN: i32 = 5;
const AI_MINUTES_MAX: i32 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PredictionSource {
    #[serde(rename = "AI")]
    Ai,
    Local,
}

impl std::fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionSource::Ai => write!(f, "AI"),
            PredictionSource::Local => write!(f, "Local"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationPrediction {
    pub minutes: i32,
    pub confidence: Confidence,
    pub source: PredictionSource,
}

/// Predict how long the outlined task will take.
///
/// Escalates to the AI port at most once, and only when the local estimate
/// came back LOW while a title was supplied. Every failure mode of the
/// escalation (circuit open, transport, timeout, bad response) keeps the
/// local result; this function never errors.
pub async fn predict_duration(
    profile: Option<&ProductivityProfile>,
    outline: &TaskOutline,
    port: Option<&dyn GenerativePort>,
    manager: &ResilienceManager,
) -> DurationPrediction {
    let local = estimate_duration(profile, outline);
    let local_prediction = DurationPrediction {
        minutes: local.minutes,
        confidence: local.confidence,
        source: PredictionSource::Local,
    };

    let has_title = outline.title.as_deref().is_some_and(|t| !t.trim().is_empty());
    if local.confidence != Confidence::Low || !has_title {
        return local_prediction;
    }
    let Some(port) = port else {
        return local_prediction;
    };

    let context = estimate_context();
    let prompt = estimate_prompt(outline, &local);
    let outcome = manager
        .guard(ops::DURATION_PREDICTION, || async {
            let raw = port.generate(context, &prompt).await?;
            parse_ai_estimate(&raw)
        })
        .await;

    match outcome {
        Ok(estimate) if estimate.confidence != Confidence::Low => {
            debug!(minutes = estimate.minutes, "adopting AI duration estimate");
            DurationPrediction {
                minutes: estimate.minutes,
                confidence: estimate.confidence,
                source: PredictionSource::Ai,
            }
        }
        Ok(_) => {
            debug!("AI estimate came back low-confidence, keeping local");
            local_prediction
        }
        Err(err) => {
            warn!(error = %err, "duration escalation failed, keeping local estimate");
            local_prediction
        }
    }
}

fn estimate_context() -> &'static str {
    "You estimate how long tasks take for a productivity tool. \
     Answer with one JSON object, no prose: \
     {\"minutes\": <integer>, \"confidence\": \"low\"|\"medium\"|\"high\"}"
}

fn estimate_prompt(outline: &TaskOutline, local: &DurationEstimate) -> String {
    let mut lines = Vec::new();
    if let Some(title) = outline.title.as_deref() {
        lines.push(format!("Title: {title}"));
    }
    if let Some(description) = outline.description.as_deref() {
        lines.push(format!("Description: {description}"));
    }
    if let Some(category) = outline.category.as_deref() {
        lines.push(format!("Category: {category}"));
    }
    if let Some(priority) = outline.priority {
        lines.push(format!("Priority: {priority:?}"));
    }
    lines.push(format!("A rough local guess was {} minutes.", local.minutes));
    lines.push("Estimate the realistic duration in minutes.".to_string());
    lines.join("\n")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AiEstimate {
    minutes: i32,
    confidence: String,
}

/// Strict parse of the model's answer. Anything that is not exactly the
/// requested schema, or lands outside the accepted band, is an error and
/// the caller keeps its local estimate.
fn parse_ai_estimate(raw: &str) -> Result<DurationEstimate, AiError> {
    let parsed: AiEstimate = serde_json::from_str(raw.trim())
        .map_err(|e| AiError::Response(format!("estimate schema: {e}")))?;

    if !(AI_MINUTES_MIN..=AI_MINUTES_MAX).contains(&parsed.minutes) {
        return Err(AiError::Response(format!(
            "estimate out of range: {} minutes",
            parsed.minutes
        )));
    }

    let confidence = match parsed.confidence.to_lowercase().as_str() {
        "high" => Confidence::High,
        "medium" => Confidence::Medium,
        "low" => Confidence::Low,
        other => return Err(AiError::Response(format!("unknown confidence: {other}"))),
    };

    Ok(DurationEstimate { minutes: parsed.minutes, confidence })
}
