//! Synthetic predictive-maintenance dataset generator.
//!
//! Simulates a fleet of industrial machines over maintenance cycles and emits one sensor
//! record per machine-day, together with service and failure labels.

pub mod config;
pub mod dataset;
pub mod simulation;
pub mod telemetry;
