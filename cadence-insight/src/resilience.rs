//! Keyed circuit registry plus the guard wrapper every AI call runs under.
//!
//! One `ResilienceManager` is shared by all concurrent requests. The map
//! lock is held only for admission and outcome recording; the guarded call
//! itself runs outside it, under the configured deadline.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use cadence_core::circuit::{Admission, CircuitBreaker, CircuitEvent, CircuitSettings, CircuitState};
use tracing::{debug, info, warn};

use crate::config::InsightConfig;
use crate::error::{AiError, InsightError};

pub struct ResilienceManager {
    timeout: Duration,
    settings: HashMap<String, CircuitSettings>,
    circuits: Mutex<HashMap<String, CircuitBreaker>>,
}

impl ResilienceManager {
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            timeout: config.ai_timeout,
            settings: config.circuits.clone(),
            circuits: Mutex::new(HashMap::new()),
        }
    }

    /// Run `call` under the named operation's circuit and the AI deadline.
    ///
    /// Fast-fails with [`InsightError::CircuitOpen`] while the circuit is
    /// open, without invoking `call`. A timeout counts as a failure.
    pub async fn guard<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, InsightError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AiError>>,
    {
        match self.admit(operation, Instant::now()) {
            Admission::Rejected => {
                debug!(operation, "circuit open, fast-failing");
                return Err(InsightError::CircuitOpen { operation: operation.to_string() });
            }
            Admission::Trial => debug!(operation, "circuit half-open, admitting trial call"),
            Admission::Allowed => {}
        }

        match tokio::time::timeout(self.timeout, call()).await {
            Ok(Ok(value)) => {
                self.record_success(operation);
                Ok(value)
            }
            Ok(Err(err)) => {
                self.record_failure(operation);
                Err(InsightError::ExternalService(err.to_string()))
            }
            Err(_) => {
                self.record_failure(operation);
                Err(InsightError::Timeout { timeout: self.timeout })
            }
        }
    }

    /// Current state for an operation; Closed if it has never been used.
    pub fn circuit_state(&self, operation: &str) -> CircuitState {
        let map = self.circuits.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(operation).map_or(CircuitState::Closed, |c| c.state())
    }

    fn admit(&self, operation: &str, now: Instant) -> Admission {
        self.with_circuit(operation, |circuit| circuit.try_acquire(now))
    }

    fn record_success(&self, operation: &str) {
        if let Some(CircuitEvent::Closed) = self.with_circuit(operation, |c| c.record_success()) {
            info!(operation, "circuit closed after recovery");
        }
    }

    fn record_failure(&self, operation: &str) {
        let now = Instant::now();
        if let Some(CircuitEvent::Opened) = self.with_circuit(operation, |c| c.record_failure(now))
        {
            warn!(operation, "circuit opened");
        }
    }

    // Lock discipline: the closure runs under the map lock and must not await.
    fn with_circuit<R>(&self, operation: &str, f: impl FnOnce(&mut CircuitBreaker) -> R) -> R {
        let mut map = self.circuits.lock().unwrap_or_else(PoisonError::into_inner);
        let circuit = map
            .entry(operation.to_string())
            .or_insert_with(|| CircuitBreaker::new(self.settings_for(operation)));
        f(circuit)
    }

    fn settings_for(&self, operation: &str) -> CircuitSettings {
        self.settings.get(operation).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn manager_with(operation: &str, settings: CircuitSettings, timeout: Duration) -> ResilienceManager {
        let mut config = InsightConfig::default();
        config.ai_timeout = timeout;
        config.circuits.insert(operation.to_string(), settings);
        ResilienceManager::new(&config)
    }

    #[tokio::test]
    async fn test_open_circuit_skips_the_call() {
        let manager = manager_with(
            "op",
            CircuitSettings {
                failure_threshold: 3,
                reset_timeout: Duration::from_secs(30),
                success_threshold: 2,
            },
            Duration::from_secs(1),
        );
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let result = manager
                .guard("op", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>(AiError::Request("boom".to_string()))
                })
                .await;
            assert!(matches!(result, Err(InsightError::ExternalService(_))));
        }
        assert_eq!(manager.circuit_state("op"), CircuitState::Open);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Fast-fail: the wrapped call is not invoked.
        let result = manager
            .guard("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("never".to_string())
            })
            .await;
        assert!(matches!(result, Err(InsightError::CircuitOpen { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let manager = manager_with(
            "op",
            CircuitSettings {
                failure_threshold: 1,
                reset_timeout: Duration::from_secs(30),
                success_threshold: 2,
            },
            Duration::from_millis(5),
        );

        let result = manager
            .guard("op", || std::future::pending::<Result<String, AiError>>())
            .await;
        assert!(matches!(result, Err(InsightError::Timeout { .. })));
        assert_eq!(manager.circuit_state("op"), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_success_passes_value_through() {
        let manager = manager_with("op", CircuitSettings::default(), Duration::from_secs(1));

        let result = manager.guard("op", || async { Ok(41 + 1) }).await;
        assert_eq!(result.ok(), Some(42));
        assert_eq!(manager.circuit_state("op"), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_recovery_after_cooldown() {
        let manager = manager_with(
            "op",
            CircuitSettings {
                failure_threshold: 1,
                reset_timeout: Duration::from_millis(40),
                success_threshold: 2,
            },
            Duration::from_secs(1),
        );

        let failed = manager
            .guard("op", || async { Err::<String, _>(AiError::Request("down".to_string())) })
            .await;
        assert!(failed.is_err());
        assert_eq!(manager.circuit_state("op"), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(80)).await;

        // Two trial successes close the circuit again.
        for _ in 0..2 {
            let ok = manager.guard("op", || async { Ok("up".to_string()) }).await;
            assert!(ok.is_ok());
        }
        assert_eq!(manager.circuit_state("op"), CircuitState::Closed);

        // Separate keys never share state.
        assert_eq!(manager.circuit_state("other"), CircuitState::Closed);
    }
}
