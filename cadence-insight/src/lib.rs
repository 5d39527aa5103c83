//! cadence-insight: the async service layer over cadence-core.
//!
//! This crate owns everything that talks to the outside world: the storage
//! ports, the generative-AI port, circuit-breaker guarded calls, and the
//! [`InsightService`] facade that hosts wire up.

pub mod ai;
pub mod config;
pub mod error;
pub mod parse;
pub mod predict;
pub mod repos;
pub mod resilience;
pub mod service;

pub use ai::GenerativePort;
pub use config::{InsightConfig, ops};
pub use error::{AiError, InsightError, Result};
pub use parse::{DueDay, TaskDraft, heuristic_parse};
pub use predict::{DurationPrediction, PredictionSource};
pub use repos::{MemoryStore, ProfileRepository, SessionRepository, TaskQueries};
pub use resilience::ResilienceManager;
pub use service::InsightService;
