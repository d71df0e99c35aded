//! Health probe module.
//!
//! A fixed probe transform is run through the shared `TransformExecutor` on
//! a schedule or on demand, and the results drive a readiness state machine
//! over `Cold`, `Warm` and `Unready`.

mod config;
mod error;
mod health;
mod state;

pub use config::ProbeConfig;
pub use error::ProbeError;
pub use health::HealthProbe;
pub use state::{LastProbe, ProbeSnapshot, ProbeState, ReadinessState};
