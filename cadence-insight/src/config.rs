//! Tunables for the insight service: the AI call deadline and the
//! per-operation circuit settings.

use std::collections::HashMap;
use std::time::Duration;

use cadence_core::circuit::CircuitSettings;

/// Operation keys for the circuit registry, so the service and its hosts
/// agree on spelling.
pub mod ops {
    pub const CHAT: &str = "chat";
    pub const PARSE_TASK: &str = "parse_task";
    pub const WELLBEING: &str = "wellbeing";
    pub const WORKFLOW: &str = "workflow";
    pub const DECOMPOSE: &str = "decompose";
    pub const REPORT: &str = "report";
    pub const DURATION_PREDICTION: &str = "duration_prediction";
}

#[derive(Debug, Clone)]
pub struct InsightConfig {
    /// Deadline applied to every guarded AI call.
    pub ai_timeout: Duration,
    /// IANA timezone for local-hour computations.
    pub timezone: String,
    /// Per-operation circuit tunables. Operations without an entry run
    /// with `CircuitSettings::default()`.
    pub circuits: HashMap<String, CircuitSettings>,
}

impl InsightConfig {
    pub fn settings_for(&self, operation: &str) -> CircuitSettings {
        self.circuits.get(operation).copied().unwrap_or_default()
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        let entry = |failures, secs| CircuitSettings {
            failure_threshold: failures,
            reset_timeout: Duration::from_secs(secs),
            success_threshold: 2,
        };

        let mut circuits = HashMap::new();
        circuits.insert(ops::CHAT.to_string(), entry(3, 30));
        circuits.insert(ops::PARSE_TASK.to_string(), entry(5, 10));
        circuits.insert(ops::WELLBEING.to_string(), entry(3, 60));
        circuits.insert(ops::WORKFLOW.to_string(), entry(5, 20));
        circuits.insert(ops::DECOMPOSE.to_string(), entry(5, 15));
        circuits.insert(ops::REPORT.to_string(), entry(3, 60));
        circuits.insert(ops::DURATION_PREDICTION.to_string(), entry(5, 15));

        Self {
            ai_timeout: Duration::from_secs(15),
            timezone: "UTC".to_string(),
            circuits,
        }
    }
}
