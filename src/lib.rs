//! # Sessy Bridge - Sessy battery and P1 meter plugin
//!
//! Polls Sessy home batteries and the Sessy P1 dongle over their local HTTP
//! API, maps the readings onto a home-automation host's device model and
//! relays strategy and setpoint commands back to the batteries.
//!
//! ## Architecture
//!
//! - `sessy`: vendor HTTP client, payload types, strategy and switch enums
//! - `energy`: cumulative energy counter from power samples
//! - `retry`: bounded retry with cubic backoff
//! - `host`: the `Host` trait binding the plugin to a device store
//! - `plugin`: lifecycle callbacks, polling, aggregation and commands
//! - `config`: YAML adapter configuration and the JSON device file
//! - `logging`: structured logging and tracing
//! - `persistence`: device store persistence for the standalone adapter
//! - `runtime`: standalone host driving the plugin
//! - `web`: HTTP API of the standalone adapter

pub mod config;
pub mod energy;
pub mod error;
pub mod host;
pub mod logging;
pub mod persistence;
pub mod plugin;
pub mod retry;
pub mod runtime;
pub mod sessy;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SessyError};
pub use plugin::SessyPlugin;
