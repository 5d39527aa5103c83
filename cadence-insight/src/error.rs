//! Error types for the insight service layer.

use cadence_core::ValidationError;
use thiserror::Error;

/// Failure from the generative port. Stays coarse: the service only ever
/// converts these into a local fallback or a log line. A port that is not
/// configured at all is an absent port, not an error.
#[derive(Debug, Error)]
pub enum AiError {
    /// Transport or provider failure.
    #[error("AI request failed: {0}")]
    Request(String),

    /// The provider answered, but not in a usable shape.
    #[error("AI response unusable: {0}")]
    Response(String),
}

/// Error type for insight operations.
#[derive(Debug, Error)]
pub enum InsightError {
    /// Fast-fail from the resilience guard: the operation's circuit is open.
    /// Distinct from [`InsightError::ExternalService`] so callers can say
    /// "temporarily disabled, retry later" instead of "showing local result".
    #[error("{operation} is temporarily unavailable, retry later")]
    CircuitOpen { operation: String },

    /// The AI call ran and failed.
    #[error("external AI service failed: {0}")]
    ExternalService(String),

    /// The AI call exceeded the configured deadline.
    #[error("external AI service timed out after {}s", timeout.as_secs())]
    Timeout { timeout: std::time::Duration },

    /// Backing store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Rejected input, passed through from the domain layer.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, InsightError>;
