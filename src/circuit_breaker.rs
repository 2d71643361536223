//! # Circuit Breaker Module
//!
//! Stops calling a remote model service after repeated failures, so a dead
//! upstream costs one fast error per request instead of a full timeout.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker for remote service calls
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold reached, requests fail fast
/// - **Reset**: After `circuit_breaker_reset_secs` the next check closes the circuit again
///
/// # Examples
///
/// ```rust
/// use funny_recipes::circuit_breaker::CircuitBreaker;
/// use funny_recipes::config::RecoveryConfig;
///
/// let breaker = CircuitBreaker::new(RecoveryConfig::default());
/// assert!(!breaker.is_open());
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    config: RecoveryConfig,
}

impl CircuitBreaker {
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            config,
        }
    }

    fn state(&self) -> MutexGuard<'_, BreakerState> {
        // A panic while holding the lock leaves plain counters behind; keep using them
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether requests should be blocked right now
    pub fn is_open(&self) -> bool {
        let mut state = self.state();

        if state.failure_count >= self.config.circuit_breaker_threshold {
            if let Some(last_time) = state.last_failure_time {
                if last_time.elapsed() < Duration::from_secs(self.config.circuit_breaker_reset_secs) {
                    return true;
                }
                *state = BreakerState::default();
            }
        }
        false
    }

    pub fn record_failure(&self) {
        let mut state = self.state();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());
    }

    pub fn record_success(&self) {
        *self.state() = BreakerState::default();
    }

    pub fn failure_count(&self) -> u32 {
        self.state().failure_count
    }
}
