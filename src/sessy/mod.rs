//! Sessy local API integration
//!
//! The client talks to batteries and P1 dongles alike; both expose the same
//! HTTP API under `http://<ip>/api/v1/...` with basic authentication. Vendor
//! strings are decoded into enums here, so the rest of the crate never sees
//! raw strategy text.

pub mod client;
pub mod strategy;
pub mod types;

pub use client::{SessyApi, SessyClient};
pub use strategy::{MIXED_LEVEL, PowerStrategy, StrategyConsensus, SwitchState};
pub use types::{DaySchedule, DynamicSchedule, EnergyStatus, P1Details, PowerStatus};
