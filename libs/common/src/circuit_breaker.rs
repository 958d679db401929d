//! Circuit breaker for remote endpoints.
//!
//! A run of consecutive transient failures opens the circuit; calls are
//! then rejected locally until a cooldown elapses, after which a limited
//! number of probe requests decide whether the endpoint has recovered.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally
    Closed,
    /// Requests are rejected without touching the network
    Open,
    /// A limited number of probes are allowed through
    HalfOpen,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Consecutive probe successes that close the circuit again
    pub success_threshold: u32,
    /// How long the circuit stays open before probing
    pub cooldown: Duration,
    /// Maximum probes allowed while half-open
    pub probe_limit: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            cooldown: Duration::from_secs(30),
            probe_limit: 3,
        }
    }
}

impl CircuitBreakerConfig {
    /// Set the failure threshold.
    #[must_use]
    pub const fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the cooldown before probing resumes.
    #[must_use]
    pub const fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    probe_successes: u32,
    probes_issued: u32,
    opened_at: Option<Instant>,
}

/// Circuit breaker guarding a single remote endpoint.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration.
    #[must_use]
    pub const fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::const_new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                probe_successes: 0,
                probes_issued: 0,
                opened_at: None,
            }),
        }
    }

    /// Create a circuit breaker with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }

    /// Whether a request may proceed right now.
    ///
    /// An open circuit whose cooldown has elapsed transitions to
    /// half-open and admits the caller as a probe.
    pub async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.cooldown)
                    .unwrap_or(false);
                if elapsed {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_successes = 0;
                    inner.probes_issued = 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.probes_issued < self.config.probe_limit {
                    inner.probes_issued += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful request.
    pub async fn report_success(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::HalfOpen => {
                inner.probe_successes += 1;
                if inner.probe_successes >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.probe_successes = 0;
                    inner.opened_at = None;
                }
            }
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed request.
    pub async fn report_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures += 1;
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => {
                if inner.consecutive_failures >= self.config.failure_threshold
                    || inner.state == CircuitState::HalfOpen
                {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    inner.probe_successes = 0;
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Current circuit state.
    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Reset to closed.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.probe_successes = 0;
        inner.probes_issued = 0;
        inner.opened_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_closed() {
        let cb = CircuitBreaker::with_defaults();
        assert_eq!(cb.state().await, CircuitState::Closed);
        assert!(cb.try_acquire().await);
    }

    #[tokio::test]
    async fn opens_after_consecutive_failures() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::default().with_failure_threshold(3));

        for _ in 0..3 {
            cb.report_failure().await;
        }

        assert_eq!(cb.state().await, CircuitState::Open);
        assert!(!cb.try_acquire().await);
    }

    #[tokio::test]
    async fn success_resets_failure_run() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::default().with_failure_threshold(3));

        cb.report_failure().await;
        cb.report_failure().await;
        cb.report_success().await;
        cb.report_failure().await;

        assert_eq!(cb.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn probes_after_cooldown_and_recloses() {
        let config = CircuitBreakerConfig {
            failure_threshold: 2,
            success_threshold: 2,
            cooldown: Duration::from_millis(1),
            probe_limit: 5,
        };
        let cb = CircuitBreaker::new(config);

        cb.report_failure().await;
        cb.report_failure().await;
        assert_eq!(cb.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(cb.try_acquire().await);
        assert_eq!(cb.state().await, CircuitState::HalfOpen);

        cb.report_success().await;
        cb.report_success().await;
        assert_eq!(cb.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn failed_probe_reopens() {
        let config = CircuitBreakerConfig {
            failure_threshold: 2,
            success_threshold: 2,
            cooldown: Duration::from_millis(1),
            probe_limit: 5,
        };
        let cb = CircuitBreaker::new(config);

        cb.report_failure().await;
        cb.report_failure().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cb.try_acquire().await);

        cb.report_failure().await;
        assert_eq!(cb.state().await, CircuitState::Open);
        assert!(!cb.try_acquire().await);
    }

    #[tokio::test]
    async fn probe_limit_bounds_half_open_traffic() {
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 10,
            cooldown: Duration::from_millis(1),
            probe_limit: 2,
        };
        let cb = CircuitBreaker::new(config);

        cb.report_failure().await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(cb.try_acquire().await);
        assert!(cb.try_acquire().await);
        assert!(!cb.try_acquire().await);
    }

    #[tokio::test]
    async fn reset_closes_the_circuit() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::default().with_failure_threshold(1));

        cb.report_failure().await;
        assert_eq!(cb.state().await, CircuitState::Open);

        cb.reset().await;
        assert_eq!(cb.state().await, CircuitState::Closed);
        assert!(cb.try_acquire().await);
    }
}
