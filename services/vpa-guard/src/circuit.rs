use crate::models::{CircuitBreakerState, CircuitState};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Breaker guarding the semantic endpoint. An open breaker turns calls into
/// `Unavailable` without touching the network.
pub struct CircuitBreaker {
    state: Arc<RwLock<CircuitBreakerState>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config("semantic".to_string(), 5, 2, 30)
    }

    pub fn with_config(
        id: String,
        failure_threshold: u32,
        recovery_threshold: u32,
        timeout_seconds: i64,
    ) -> Self {
        CircuitBreaker {
            state: Arc::new(RwLock::new(CircuitBreakerState {
                id,
                state: CircuitState::Closed,
                failure_count: 0,
                failure_threshold: failure_threshold.max(1),
                success_count: 0,
                recovery_threshold: recovery_threshold.max(1),
                last_failure_time: None,
                timeout_duration: timeout_seconds.max(0),
            })),
        }
    }

    /// Whether a call may go out now. Moves Open to HalfOpen once the
    /// cool-down has elapsed.
    pub async fn allow_request(&self) -> bool {
        let mut state = self.state.write().await;
        if state.state == CircuitState::Open {
            if Self::should_attempt_reset(&state) {
                info!("Circuit breaker {} transitioning to HalfOpen", state.id);
                state.state = CircuitState::HalfOpen;
                state.success_count = 0;
            } else {
                warn!("Circuit breaker {} is OPEN, rejecting request", state.id);
                return false;
            }
        }
        true
    }

    /// Record a successful operation
    pub async fn on_success(&self) {
        let mut state = self.state.write().await;

        match state.state {
            CircuitState::HalfOpen => {
                state.success_count += 1;
                if state.success_count >= state.recovery_threshold {
                    info!(
                        "Circuit breaker {} recovered - transitioning to Closed",
                        state.id
                    );
                    state.state = CircuitState::Closed;
                    state.failure_count = 0;
                    state.success_count = 0;
                }
            }
            CircuitState::Closed => {
                state.failure_count = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed operation
    pub async fn on_failure(&self) {
        let mut state = self.state.write().await;
        state.last_failure_time = Some(Utc::now());

        match state.state {
            CircuitState::Closed => {
                state.failure_count += 1;
                if state.failure_count >= state.failure_threshold {
                    warn!(
                        "Circuit breaker {} TRIPPED - transitioning to Open (failures: {})",
                        state.id, state.failure_count
                    );
                    state.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                warn!("Circuit breaker {} failed in HalfOpen - back to Open", state.id);
                state.state = CircuitState::Open;
                state.failure_count = 0;
                state.success_count = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Manually reset the circuit breaker
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        info!("Circuit breaker {} manually reset to Closed", state.id);
        state.state = CircuitState::Closed;
        state.failure_count = 0;
        state.success_count = 0;
        state.last_failure_time = None;
    }

    pub async fn get_state(&self) -> CircuitBreakerState {
        self.state.read().await.clone()
    }

    fn should_attempt_reset(state: &CircuitBreakerState) -> bool {
        match state.last_failure_time {
            Some(last_failure) => {
                (Utc::now() - last_failure).num_seconds() >= state.timeout_duration
            }
            None => true,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let cb = CircuitBreaker::with_config("test".to_string(), 3, 2, 60);

        for _ in 0..3 {
            assert!(cb.allow_request().await);
            cb.on_failure().await;
        }

        let state = cb.get_state().await;
        assert_eq!(state.state, CircuitState::Open);
        assert!(!cb.allow_request().await);
    }

    #[tokio::test]
    async fn test_success_clears_failure_streak() {
        let cb = CircuitBreaker::with_config("test".to_string(), 3, 2, 60);

        cb.on_failure().await;
        cb.on_failure().await;
        cb.on_success().await;
        cb.on_failure().await;

        let state = cb.get_state().await;
        assert_eq!(state.state, CircuitState::Closed);
        assert_eq!(state.failure_count, 1);
    }

    #[tokio::test]
    async fn test_circuit_breaker_recovers() {
        let cb = CircuitBreaker::with_config("test".to_string(), 3, 2, 0);

        for _ in 0..3 {
            cb.on_failure().await;
        }

        // Zero cool-down: the next request probes in HalfOpen
        assert!(cb.allow_request().await);
        cb.on_success().await;
        assert_eq!(cb.get_state().await.state, CircuitState::HalfOpen);

        cb.on_success().await;
        assert_eq!(cb.get_state().await.state, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens() {
        let cb = CircuitBreaker::with_config("test".to_string(), 1, 2, 0);

        cb.on_failure().await;
        assert!(cb.allow_request().await);
        cb.on_failure().await;

        assert_eq!(cb.get_state().await.state, CircuitState::Open);
    }

    #[tokio::test]
    async fn test_manual_reset() {
        let cb = CircuitBreaker::with_config("test".to_string(), 1, 1, 60);

        cb.on_failure().await;
        assert!(!cb.allow_request().await);

        cb.reset().await;
        let state = cb.get_state().await;
        assert_eq!(state.state, CircuitState::Closed);
        assert!(state.last_failure_time.is_none());
        assert!(cb.allow_request().await);
    }
}
