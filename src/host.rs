//! Seam between the plugin and the host's device store
//!
//! A home-automation host owns device registration, value persistence and
//! the heartbeat. The plugin only sees the [`Host`] trait. [`MemoryHost`] is
//! the store used by the standalone adapter and by tests.

use crate::error::{Result, SessyError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Device id of the synthetic device carrying the system aggregate
pub const SYSTEM_DEVICE_ID: &str = "System";

/// Host sensor/actuator types the plugin creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    /// sValue is a percentage
    Percentage,
    /// Instantaneous power in W
    Usage,
    /// `"power;cumulative_wh"` energy meter
    Counter,
    /// Selector switch; nValue/sValue is the level
    Selector { levels: Vec<(u32, String)> },
    /// Numeric setpoint in W
    Setpoint,
    /// Free text
    Text,
    /// `"usage1;usage2;return1;return2;cons;prod"`
    SmartMeter,
}

/// Everything the host needs to create one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub device_id: String,
    pub unit: u8,
    pub name: String,
    pub kind: DeviceKind,
}

/// A value pushed to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUpdate {
    pub n_value: i64,
    pub s_value: String,
}

impl DeviceUpdate {
    /// Update carrying only an sValue
    pub fn text<S: Into<String>>(s_value: S) -> Self {
        Self {
            n_value: 0,
            s_value: s_value.into(),
        }
    }

    /// Update where nValue and sValue carry the same level
    pub fn level(level: u32) -> Self {
        Self {
            n_value: i64::from(level),
            s_value: level.to_string(),
        }
    }
}

/// What the host remembers of a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredValue {
    pub n_value: i64,
    pub s_value: String,
    pub last_update: DateTime<Utc>,
}

/// Device store and scheduling owned by the host
pub trait Host: Send {
    fn has_device(&self, device_id: &str, unit: u8) -> bool;

    fn create_device(&mut self, spec: DeviceSpec) -> Result<()>;

    fn update_device(&mut self, device_id: &str, unit: u8, update: DeviceUpdate) -> Result<()>;

    /// Last value and update time, if the unit ever received one
    fn stored_value(&self, device_id: &str, unit: u8) -> Option<StoredValue>;

    /// Ask the host to call `on_heartbeat` every `seconds`
    fn set_heartbeat(&mut self, seconds: u64);

    /// Host wall clock
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One unit in the in-memory store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostDevice {
    pub spec: DeviceSpec,
    pub value: Option<StoredValue>,
}

/// In-memory device store
#[derive(Debug, Default)]
pub struct MemoryHost {
    devices: BTreeMap<(String, u8), HostDevice>,
    heartbeat_seconds: Option<u64>,
    clock: Option<DateTime<Utc>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted devices
    pub fn from_devices(devices: Vec<HostDevice>) -> Self {
        let devices = devices
            .into_iter()
            .map(|d| ((d.spec.device_id.clone(), d.spec.unit), d))
            .collect();
        Self {
            devices,
            ..Self::default()
        }
    }

    /// All units, ordered by device id and unit
    pub fn devices(&self) -> Vec<HostDevice> {
        self.devices.values().cloned().collect()
    }

    pub fn device(&self, device_id: &str, unit: u8) -> Option<&HostDevice> {
        self.devices.get(&(device_id.to_string(), unit))
    }

    /// Current sValue of a unit
    pub fn s_value(&self, device_id: &str, unit: u8) -> Option<&str> {
        self.device(device_id, unit)
            .and_then(|d| d.value.as_ref())
            .map(|v| v.s_value.as_str())
    }

    pub fn heartbeat_seconds(&self) -> Option<u64> {
        self.heartbeat_seconds
    }

    /// Pin the clock; `None` returns to wall-clock time
    pub fn set_clock(&mut self, now: Option<DateTime<Utc>>) {
        self.clock = now;
    }
}

impl Host for MemoryHost {
    fn has_device(&self, device_id: &str, unit: u8) -> bool {
        self.devices.contains_key(&(device_id.to_string(), unit))
    }

    fn create_device(&mut self, spec: DeviceSpec) -> Result<()> {
        let key = (spec.device_id.clone(), spec.unit);
        if self.devices.contains_key(&key) {
            return Err(SessyError::host(format!(
                "Device {} unit {} already exists",
                spec.device_id, spec.unit
            )));
        }
        self.devices.insert(key, HostDevice { spec, value: None });
        Ok(())
    }

    fn update_device(&mut self, device_id: &str, unit: u8, update: DeviceUpdate) -> Result<()> {
        let now = self.now();
        let device = self
            .devices
            .get_mut(&(device_id.to_string(), unit))
            .ok_or_else(|| {
                SessyError::host(format!("Unknown device {} unit {}", device_id, unit))
            })?;
        device.value = Some(StoredValue {
            n_value: update.n_value,
            s_value: update.s_value,
            last_update: now,
        });
        Ok(())
    }

    fn stored_value(&self, device_id: &str, unit: u8) -> Option<StoredValue> {
        self.device(device_id, unit).and_then(|d| d.value.clone())
    }

    fn set_heartbeat(&mut self, seconds: u64) {
        self.heartbeat_seconds = Some(seconds);
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }
}
