//! Circuit breaker: an explicit Closed → Open → HalfOpen state machine.
//!
//! Cooldown timing uses `Instant` passed in by the caller, which keeps
//! the transitions deterministic under test.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct BreakerSettings {
    /// Consecutive transient failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a trial call.
    pub cooldown: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed { consecutive_failures: u32 },
    Open { until: Instant },
    // A trial whose outcome is never reported (the caller's future was
    // dropped mid-call) must not wedge the breaker; acquire reclaims
    // the slot once the trial is a full cooldown old.
    HalfOpen { trial_started: Instant },
}

/// Whether a call may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permit {
    /// Circuit closed; call passes through.
    Allowed,
    /// Half-open trial call; its outcome decides the next state.
    Trial,
    /// Circuit open; fail fast without touching the downstream.
    Rejected,
}

pub struct CircuitBreaker {
    dependency: &'static str,
    settings: BreakerSettings,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(dependency: &'static str, settings: BreakerSettings) -> Self {
        Self {
            dependency,
            settings,
            state: Mutex::new(State::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    pub fn dependency(&self) -> &'static str {
        self.dependency
    }

    /// Ask whether a call may go downstream at `now`.
    pub fn acquire(&self, now: Instant) -> Permit {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            State::Closed { .. } => Permit::Allowed,
            State::Open { until } if now >= until => {
                *state = State::HalfOpen { trial_started: now };
                Permit::Trial
            }
            State::Open { .. } => Permit::Rejected,
            State::HalfOpen { trial_started }
                if now >= trial_started + self.settings.cooldown =>
            {
                warn!(
                    dependency = self.dependency,
                    "trial call abandoned, admitting a new trial"
                );
                *state = State::HalfOpen { trial_started: now };
                Permit::Trial
            }
            State::HalfOpen { .. } => Permit::Rejected,
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(*state, State::HalfOpen { .. }) {
            counter!("mercato_breaker_close_total", "dependency" => self.dependency).increment(1);
        }
        *state = State::Closed {
            consecutive_failures: 0,
        };
    }

    pub fn record_failure(&self, now: Instant) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            State::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures + 1;
                if failures >= self.settings.failure_threshold {
                    warn!(
                        dependency = self.dependency,
                        failures, "circuit opened after consecutive failures"
                    );
                    counter!("mercato_breaker_open_total", "dependency" => self.dependency)
                        .increment(1);
                    *state = State::Open {
                        until: now + self.settings.cooldown,
                    };
                } else {
                    *state = State::Closed {
                        consecutive_failures: failures,
                    };
                }
            }
            State::HalfOpen { .. } => {
                warn!(dependency = self.dependency, "trial call failed, re-opening circuit");
                counter!("mercato_breaker_open_total", "dependency" => self.dependency)
                    .increment(1);
                *state = State::Open {
                    until: now + self.settings.cooldown,
                };
            }
            // A rejected caller reporting failure must not extend the cooldown.
            State::Open { .. } => {}
        }
    }
}
