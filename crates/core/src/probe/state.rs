//! Readiness state machine driven by probe results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Readiness derived from recent probe results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    /// No passing streak yet; readiness not determined.
    Cold,
    /// Enough consecutive passing probes; ready for traffic.
    Warm,
    /// Too many consecutive failing probes.
    Unready,
}

impl ReadinessState {
    pub fn is_ready(self) -> bool {
        self == Self::Warm
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cold => "cold",
            Self::Warm => "warm",
            Self::Unready => "unready",
        }
    }
}

/// Result of the most recent probe run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastProbe {
    pub at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Point-in-time view of the probe state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeSnapshot {
    pub state: ReadinessState,
    pub ready: bool,
    pub total_runs: u64,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_probe: Option<LastProbe>,
}

/// Counters and readiness flag, owned by one `HealthProbe`.
///
/// Transitions:
/// - a pass clears the failure count and extends the success streak;
///   a streak of `min_successes` makes the state `Warm`
/// - a failure clears the streak and extends the failure count;
///   `max_failures` in a row make the state `Unready`
/// - a failure below the threshold leaves the state unchanged
#[derive(Debug, Clone)]
pub struct ProbeState {
    state: ReadinessState,
    total_runs: u64,
    consecutive_successes: u32,
    consecutive_failures: u32,
    last_probe: Option<LastProbe>,
    last_probe_at: Option<Instant>,
    min_successes: u32,
    max_failures: u32,
}

impl ProbeState {
    pub fn new(min_successes: u32, max_failures: u32) -> Self {
        Self {
            state: ReadinessState::Cold,
            total_runs: 0,
            consecutive_successes: 0,
            consecutive_failures: 0,
            last_probe: None,
            last_probe_at: None,
            min_successes: min_successes.max(1),
            max_failures: max_failures.max(1),
        }
    }

    /// Records a passing probe and returns the new state.
    pub fn record_success(&mut self, elapsed: Duration) -> ReadinessState {
        self.record(elapsed, None);
        self.consecutive_failures = 0;
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        if self.consecutive_successes >= self.min_successes {
            self.state = ReadinessState::Warm;
        }
        self.state
    }

    /// Records a failing probe and returns the new state.
    pub fn record_failure(&mut self, elapsed: Duration, error: impl Into<String>) -> ReadinessState {
        self.record(elapsed, Some(error.into()));
        self.consecutive_successes = 0;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= self.max_failures {
            self.state = ReadinessState::Unready;
        }
        self.state
    }

    fn record(&mut self, elapsed: Duration, error: Option<String>) {
        self.total_runs += 1;
        self.last_probe_at = Some(Instant::now());
        self.last_probe = Some(LastProbe {
            at: Utc::now(),
            elapsed_ms: elapsed.as_millis() as u64,
            passed: error.is_none(),
            error,
        });
    }

    /// Whether the last result is older than `window` (or there is none).
    pub fn is_stale(&self, window: Duration) -> bool {
        self.last_probe_at
            .map(|at| at.elapsed() >= window)
            .unwrap_or(true)
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn total_runs(&self) -> u64 {
        self.total_runs
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_probe(&self) -> Option<&LastProbe> {
        self.last_probe.as_ref()
    }

    pub fn snapshot(&self) -> ProbeSnapshot {
        ProbeSnapshot {
            state: self.state,
            ready: self.is_ready(),
            total_runs: self.total_runs,
            consecutive_successes: self.consecutive_successes,
            consecutive_failures: self.consecutive_failures,
            last_probe: self.last_probe.clone(),
        }
    }
}
