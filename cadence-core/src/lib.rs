//! cadence-core: productivity intelligence primitives for the Cadence suite

pub mod burnout;
pub mod circuit;
pub mod learning;
pub mod patterns;
pub mod profile;
pub mod rest;
pub mod schedule;
pub mod session;
pub mod task;
pub mod time;
pub mod wellbeing;

pub use burnout::{BurnoutAnalysis, RiskLevel, Severity, Warning, WarningKind};
pub use circuit::{Admission, CircuitBreaker, CircuitEvent, CircuitSettings, CircuitState};
pub use learning::{LearnError, learn_from_session, productivity_sample};
pub use patterns::{
    CompletionTrend,
    TaskActivity,
    TaskLoadTrend,
    WorkPatternSnapshot,
    analyze_patterns,
};
pub use profile::{ProductivityProfile, SmoothingConfig, ValidationError};
pub use rest::{
    Intervention,
    InterventionKind,
    RestContext,
    RestKind,
    RestPriority,
    RestRecommendation,
    decide_intervention,
    recommend_rest,
};
pub use schedule::{
    Confidence, DurationEstimate, OptimalSchedule, TaskOutline, build_optimal_schedule,
    estimate_duration,
};
pub use session::{SessionKind, WorkSession};
pub use task::{Priority, Task, TaskStatus};
pub use time::{TimeError, day_name, is_late_night, is_weekend, parse_local_to_utc, parse_timezone};
pub use wellbeing::{WeeklySummary, summarize_week};
