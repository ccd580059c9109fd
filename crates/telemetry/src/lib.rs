//! Controller telemetry access for the VIP client monitor.
//!
//! This crate provides:
//! - `TelemetrySource` trait so the monitor engine can run against a mock
//! - `ControllerClient` — token-authenticated reqwest client for the
//!   controller's user-enrichment and device-detail endpoints

pub mod client;
pub mod source;

pub use client::ControllerClient;
pub use source::{TelemetryError, TelemetrySource};
