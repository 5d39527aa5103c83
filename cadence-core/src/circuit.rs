//! Circuit breaker guarding calls into the external AI backend.
//!
//! One breaker covers one protected operation; the service layer keeps a
//! keyed registry of them. The clock is passed in, so cooldown behavior is
//! testable without sleeping.
//!
//! ```text
//! Closed --threshold failures--> Open --cooldown elapsed--> HalfOpen
//!   ^                              ^                           |
//!   |                              '-------one failure---------|
//!   '----success streak------------------------------------------'
//! ```

use std::time::{Duration, Instant};

/// State of one protected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitState {
    /// Normal operation; failures are being counted.
    #[default]
    Closed,
    /// Fast-failing; the backend gets a cooldown.
    Open,
    /// Cooldown expired; trial calls probe for recovery.
    HalfOpen,
}

/// Tunables for one breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSettings {
    /// Consecutive failures while Closed that open the circuit.
    pub failure_threshold: u32,
    /// How long to fast-fail before trialing recovery.
    pub reset_timeout: Duration,
    /// Consecutive HalfOpen successes that close the circuit.
    pub success_threshold: u32,
}

impl Default for CircuitSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State-change event, for the caller to log against its operation key.
/// The open-to-half-open transition surfaces as [`Admission::Trial`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitEvent {
    Opened,
    Closed,
}

/// Admission decision for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Run the operation normally.
    Allowed,
    /// Run the operation as a recovery trial (circuit just moved to HalfOpen).
    Trial,
    /// Fast-fail without running the operation.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    settings: CircuitSettings,
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(settings: CircuitSettings) -> Self {
        Self {
            settings,
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_at: None,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Decide whether an invocation may run at `now`.
    ///
    /// While Open, the first call after the reset timeout flips the circuit
    /// to HalfOpen and is admitted as a trial; earlier calls are rejected
    /// without touching the wrapped operation.
    pub fn try_acquire(&mut self, now: Instant) -> Admission {
        match self.state {
            CircuitState::Closed => Admission::Allowed,
            // Concurrent trials are admitted; recording sorts out the outcome.
            CircuitState::HalfOpen => Admission::Allowed,
            CircuitState::Open => {
                if let Some(at) = self.last_failure_at
                    && now.duration_since(at) > self.settings.reset_timeout
                {
                    self.state = CircuitState::HalfOpen;
                    self.success_count = 0;
                    return Admission::Trial;
                }
                Admission::Rejected
            }
        }
    }

    pub fn record_success(&mut self) -> Option<CircuitEvent> {
        match self.state {
            CircuitState::Closed => {
                self.failure_count = 0;
                None
            }
            CircuitState::HalfOpen => {
                self.success_count += 1;
                if self.success_count >= self.settings.success_threshold {
                    self.state = CircuitState::Closed;
                    self.failure_count = 0;
                    self.success_count = 0;
                    return Some(CircuitEvent::Closed);
                }
                None
            }
            // A straggler finishing after the circuit re-opened; ignore.
            CircuitState::Open => None,
        }
    }

    pub fn record_failure(&mut self, now: Instant) -> Option<CircuitEvent> {
        match self.state {
            CircuitState::Closed => {
                self.failure_count += 1;
                if self.failure_count >= self.settings.failure_threshold {
                    self.state = CircuitState::Open;
                    self.last_failure_at = Some(now);
                    return Some(CircuitEvent::Opened);
                }
                None
            }
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.success_count = 0;
                self.last_failure_at = Some(now);
                Some(CircuitEvent::Opened)
            }
            CircuitState::Open => {
                self.last_failure_at = Some(now);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CircuitSettings {
        CircuitSettings {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }

    #[test]
    fn test_starts_closed_and_admits() {
        let mut cb = CircuitBreaker::new(settings());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.try_acquire(Instant::now()), Admission::Allowed);
    }

    #[test]
    fn test_opens_on_failure_threshold() {
        let mut cb = CircuitBreaker::new(settings());
        let t0 = Instant::now();

        assert_eq!(cb.record_failure(t0), None);
        assert_eq!(cb.record_failure(t0), None);
        assert_eq!(cb.record_failure(t0), Some(CircuitEvent::Opened));
        assert_eq!(cb.state(), CircuitState::Open);

        // Immediately after opening, calls are rejected.
        assert_eq!(cb.try_acquire(t0), Admission::Rejected);
    }

    #[test]
    fn test_success_resets_failure_count_while_closed() {
        let mut cb = CircuitBreaker::new(settings());
        let t0 = Instant::now();

        cb.record_failure(t0);
        cb.record_failure(t0);
        assert_eq!(cb.failure_count(), 2);
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);

        // Two more failures are not enough to open after the reset.
        cb.record_failure(t0);
        cb.record_failure(t0);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_after_reset_timeout() {
        let mut cb = CircuitBreaker::new(settings());
        let t0 = Instant::now();

        for _ in 0..3 {
            cb.record_failure(t0);
        }
        assert_eq!(cb.state(), CircuitState::Open);

        // Just inside the timeout: still rejected.
        assert_eq!(cb.try_acquire(t0 + Duration::from_secs(30)), Admission::Rejected);
        // Strictly past the timeout: admitted as a trial.
        assert_eq!(cb.try_acquire(t0 + Duration::from_secs(31)), Admission::Trial);
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_closes_after_success_streak() {
        let mut cb = CircuitBreaker::new(settings());
        let t0 = Instant::now();

        for _ in 0..3 {
            cb.record_failure(t0);
        }
        cb.try_acquire(t0 + Duration::from_secs(31));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        assert_eq!(cb.record_success(), None);
        assert_eq!(cb.record_success(), Some(CircuitEvent::Closed));
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let mut cb = CircuitBreaker::new(settings());
        let t0 = Instant::now();

        for _ in 0..3 {
            cb.record_failure(t0);
        }
        cb.try_acquire(t0 + Duration::from_secs(31));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        let t1 = t0 + Duration::from_secs(32);
        assert_eq!(cb.record_failure(t1), Some(CircuitEvent::Opened));
        assert_eq!(cb.state(), CircuitState::Open);

        // Cooldown restarts from the new failure.
        assert_eq!(cb.try_acquire(t1 + Duration::from_secs(30)), Admission::Rejected);
        assert_eq!(cb.try_acquire(t1 + Duration::from_secs(31)), Admission::Trial);
    }
}
