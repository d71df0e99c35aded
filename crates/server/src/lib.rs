//! HTTP hosting layer for the transform engine.

pub mod api;
pub mod metrics;
pub mod state;
