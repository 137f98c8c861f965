//! Core plugin logic for Sessy Bridge
//!
//! [`SessyPlugin`] carries the host callbacks as methods. The host (or the
//! standalone adapter) constructs one instance and drives it: `on_start`
//! once, `on_heartbeat` on every tick, `on_command` when a user touches a
//! device, `on_stop` at shutdown. Each call runs to completion before the
//! next one starts.

use crate::config::{DeviceConfig, DeviceFile, PluginConfig};
use crate::error::{Result, SessyError};
use crate::host::Host;
use crate::logging::{StructuredLogger, get_logger};
use crate::retry::RetryPolicy;
use crate::sessy::{SessyApi, SessyClient};
use std::sync::Arc;
use std::time::Duration;

pub mod aggregate;
mod commands;
pub mod devices;
mod poll;

pub use aggregate::{BatteryReading, SystemAggregate};
pub use commands::{CommandVerb, setpoint_share};

/// Builds an API handle for a configured device
pub trait Connector: Send + Sync {
    fn connect(&self, device: &DeviceConfig) -> Result<Arc<dyn SessyApi>>;
}

/// Connector producing real HTTP clients
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, device: &DeviceConfig) -> Result<Arc<dyn SessyApi>> {
        Ok(Arc::new(SessyClient::new(device, self.timeout)?))
    }
}

/// A configured device and its API handle
#[derive(Clone)]
pub(crate) struct Endpoint {
    pub(crate) config: DeviceConfig,
    pub(crate) api: Arc<dyn SessyApi>,
}

/// Plugin lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginState {
    /// `on_start` has not run yet
    Stopped,
    /// Devices created, heartbeats poll
    Running,
    /// Startup failed; heartbeats do nothing
    Disabled(String),
}

/// Sessy battery plugin instance
pub struct SessyPlugin {
    settings: PluginConfig,
    retry: RetryPolicy,
    connector: Arc<dyn Connector>,
    batteries: Vec<Endpoint>,
    meters: Vec<Endpoint>,
    state: PluginState,
    /// Heartbeats left until the next poll pass
    run_counter: u32,
    /// Heartbeats left until the next P1/schedule poll
    p1_counter: u32,
    logger: StructuredLogger,
}

impl SessyPlugin {
    /// Create a plugin; nothing is read or contacted until `on_start`
    pub fn new(settings: PluginConfig, connector: Arc<dyn Connector>) -> Self {
        let retry = RetryPolicy::from_config(&settings);
        Self {
            settings,
            retry,
            connector,
            batteries: Vec::new(),
            meters: Vec::new(),
            state: PluginState::Stopped,
            run_counter: 1,
            p1_counter: 0,
            logger: get_logger("plugin"),
        }
    }

    pub fn state(&self) -> &PluginState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == PluginState::Running
    }

    /// Names of the configured batteries
    pub fn battery_names(&self) -> Vec<&str> {
        self.batteries.iter().map(|b| b.config.name.as_str()).collect()
    }

    /// Read the device file, create missing devices, start the heartbeat
    pub fn on_start(&mut self, host: &mut dyn Host) -> Result<()> {
        self.logger.info(&format!(
            "Starting, reading devices from {}",
            self.settings.devices_file
        ));
        let devices = match DeviceFile::from_file(&self.settings.devices_file) {
            Ok(devices) => devices,
            Err(e) => {
                self.disable(&e);
                return Err(e);
            }
        };
        self.start_with_devices(host, devices)
    }

    /// Start from an already parsed device file
    pub fn start_with_devices(&mut self, host: &mut dyn Host, devices: DeviceFile) -> Result<()> {
        if let Err(e) = self.try_start(host, devices) {
            self.disable(&e);
            return Err(e);
        }
        self.state = PluginState::Running;
        self.run_counter = 1;
        self.p1_counter = 0;
        host.set_heartbeat(self.settings.heartbeat_seconds);
        self.logger.info(&format!(
            "Started with {} batteries and {} P1 meters",
            self.batteries.len(),
            self.meters.len()
        ));
        Ok(())
    }

    fn try_start(&mut self, host: &mut dyn Host, devices: DeviceFile) -> Result<()> {
        devices.validate()?;

        let connect = |list: &[DeviceConfig]| -> Result<Vec<Endpoint>> {
            list.iter()
                .map(|config| {
                    Ok(Endpoint {
                        api: self.connector.connect(config)?,
                        config: config.clone(),
                    })
                })
                .collect()
        };
        let batteries = connect(&devices.batteries)?;
        let meters = connect(&devices.p1meter)?;

        let mut specs = Vec::new();
        for battery in &batteries {
            specs.extend(devices::battery_specs(&battery.config.name));
        }
        if !batteries.is_empty() {
            specs.extend(devices::system_specs());
        }
        for meter in &meters {
            specs.extend(devices::p1_specs(&meter.config.name));
        }
        for spec in specs {
            if !host.has_device(&spec.device_id, spec.unit) {
                self.logger
                    .debug(&format!("Creating device {}", spec.name));
                host.create_device(spec)?;
            }
        }

        self.batteries = batteries;
        self.meters = meters;
        Ok(())
    }

    fn disable(&mut self, error: &SessyError) {
        self.logger
            .error(&format!("Startup failed, plugin disabled: {}", error));
        self.batteries.clear();
        self.meters.clear();
        self.state = PluginState::Disabled(error.to_string());
    }

    /// One host heartbeat tick
    ///
    /// Too many failed retries abort the battery pass with an error; the
    /// next tick starts over. A due P1 and schedule poll still runs.
    pub async fn on_heartbeat(&mut self, host: &mut dyn Host) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let poll_meters = self.p1_counter == 0;
        if poll_meters {
            self.p1_counter = self.settings.p1_interval_ticks;
        }
        self.p1_counter = self.p1_counter.saturating_sub(1);

        self.run_counter = self.run_counter.saturating_sub(1);
        let batteries = if self.run_counter == 0 {
            self.run_counter = self.settings.refresh_ticks;
            self.poll_batteries(host).await
        } else {
            Ok(())
        };

        let meters = if poll_meters {
            let meters = self.poll_meters(host).await;
            self.poll_schedule(host).await;
            meters
        } else {
            Ok(())
        };
        batteries.and(meters)
    }

    /// Release devices; the host keeps their values
    pub fn on_stop(&mut self) {
        self.logger.info("Stopping");
        self.batteries.clear();
        self.meters.clear();
        self.state = PluginState::Stopped;
    }

    /// Make the next heartbeat run a poll pass
    pub(crate) fn request_poll(&mut self) {
        self.run_counter = 1;
    }
}
