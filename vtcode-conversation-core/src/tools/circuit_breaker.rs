//! Per-tool circuit breaker (`SPEC_FULL.md` §3 supplement, grounded on
//! `vtcode-core::tools::circuit_breaker`). Ambient resiliency, not a spec
//! feature: closed (disabled) by default so tests never trip it unless they
//! mean to.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

#[derive(Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, cooldown: Duration::from_secs(60) }
    }
}

#[derive(Debug, Clone, Default)]
struct ToolCircuitState {
    status: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
}

/// Tracks consecutive failures per tool name independently so one
/// misbehaving tool cannot disable the rest.
#[derive(Clone)]
pub struct CircuitBreaker {
    states: std::sync::Arc<RwLock<HashMap<String, ToolCircuitState>>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self { states: std::sync::Arc::new(RwLock::new(HashMap::new())), config }
    }

    pub fn allow(&self, tool_name: &str) -> bool {
        let states = self.states.read();
        match states.get(tool_name) {
            None => true,
            Some(state) => match state.status {
                CircuitState::Closed | CircuitState::HalfOpen => true,
                CircuitState::Open => {
                    let Some(opened_at) = state.opened_at else { return true };
                    if opened_at.elapsed() >= self.config.cooldown {
                        drop(states);
                        let mut states = self.states.write();
                        if let Some(state) = states.get_mut(tool_name) {
                            state.status = CircuitState::HalfOpen;
                        }
                        true
                    } else {
                        false
                    }
                }
            },
        }
    }

    pub fn record_success(&self, tool_name: &str) {
        let mut states = self.states.write();
        let state = states.entry(tool_name.to_string()).or_default();
        state.status = CircuitState::Closed;
        state.failure_count = 0;
        state.opened_at = None;
    }

    pub fn record_failure(&self, tool_name: &str) {
        let mut states = self.states.write();
        let state = states.entry(tool_name.to_string()).or_default();
        match state.status {
            CircuitState::HalfOpen => {
                state.status = CircuitState::Open;
                state.opened_at = Some(Instant::now());
            }
            _ => {
                state.failure_count += 1;
                if state.failure_count >= self.config.failure_threshold {
                    state.status = CircuitState::Open;
                    state.opened_at = Some(Instant::now());
                    tracing::warn!(tool = tool_name, failures = state.failure_count, "circuit breaker open for tool");
                }
            }
        }
    }

    pub fn state_of(&self, tool_name: &str) -> CircuitState {
        self.states.read().get(tool_name).map(|s| s.status).unwrap_or_default()
    }

    pub fn reset(&self, tool_name: &str) {
        self.states.write().remove(tool_name);
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig { failure_threshold: 3, cooldown: Duration::from_secs(60) });
        for _ in 0..2 {
            breaker.record_failure("shell");
            assert!(breaker.allow("shell"));
        }
        breaker.record_failure("shell");
        assert!(!breaker.allow("shell"));
        assert_eq!(breaker.state_of("shell"), CircuitState::Open);
    }

    #[test]
    fn success_resets_failure_count() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig { failure_threshold: 3, cooldown: Duration::from_secs(60) });
        breaker.record_failure("shell");
        breaker.record_failure("shell");
        breaker.record_success("shell");
        breaker.record_failure("shell");
        breaker.record_failure("shell");
        assert!(breaker.allow("shell"), "two failures after a reset should not trip the breaker");
    }

    #[test]
    fn unknown_tools_are_always_allowed() {
        let breaker = CircuitBreaker::default();
        assert!(breaker.allow("never_registered"));
    }
}
