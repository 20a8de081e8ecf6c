//! Telemetry pipeline for real-time KPIs and historical benchmarking.

mod pipeline;

pub use pipeline::{TelemetryEvent, TelemetryPipeline};
