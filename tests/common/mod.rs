#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use sessy_bridge::config::{DeviceConfig, DeviceFile, PluginConfig};
use sessy_bridge::error::{Result, SessyError};
use sessy_bridge::plugin::Connector;
use sessy_bridge::sessy::{
    DaySchedule, EnergyStatus, P1Details, PowerStatus, PowerStrategy, SessyApi,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted Sessy device
pub struct FakeSessy {
    name: String,
    state_of_charge: f64,
    power: i64,
    strategy: Mutex<String>,
    /// Status calls that fail with a transport error before answering
    failures: AtomicU32,
    pub status_calls: AtomicU32,
    pub p1_calls: AtomicU32,
    pub schedule_calls: AtomicU32,
    pub sent: Mutex<Vec<String>>,
    p1: P1Details,
    schedule: Option<DaySchedule>,
    /// Strategy and setpoint writes are refused
    rejecting: bool,
}

impl FakeSessy {
    pub fn battery(name: &str, state_of_charge: f64, power: i64) -> Self {
        Self {
            name: name.to_string(),
            state_of_charge,
            power,
            strategy: Mutex::new("POWER_STRATEGY_API".to_string()),
            failures: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            p1_calls: AtomicU32::new(0),
            schedule_calls: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
            p1: P1Details::default(),
            schedule: None,
            rejecting: false,
        }
    }

    pub fn meter(name: &str, p1: P1Details) -> Self {
        Self {
            p1,
            ..Self::battery(name, 0.0, 0)
        }
    }

    pub fn with_strategy(self, vendor: &str) -> Self {
        *self.strategy.lock().unwrap() = vendor.to_string();
        self
    }

    pub fn failing(self, times: u32) -> Self {
        self.failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn rejecting(mut self) -> Self {
        self.rejecting = true;
        self
    }

    pub fn with_schedule(mut self, schedule: DaySchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn maybe_reject(&self) -> Result<()> {
        if self.rejecting {
            return Err(SessyError::request(500, "Not allowed"));
        }
        Ok(())
    }

    fn maybe_fail(&self) -> Result<()> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(SessyError::transport("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl SessyApi for FakeSessy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_power_status(&self) -> Result<PowerStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        Ok(serde_json::from_value(serde_json::json!({
            "status": "ok",
            "sessy": {
                "state_of_charge": self.state_of_charge,
                "power": self.power,
                "power_setpoint": self.power,
                "system_state": "SYSTEM_STATE_RUNNING_SAFE"
            }
        }))?)
    }

    async fn get_energy_status(&self) -> Result<EnergyStatus> {
        Ok(serde_json::from_value(serde_json::json!({
            "status": "ok",
            "sessy_energy": {"import_wh": 1000.0, "export_wh": 800.0}
        }))?)
    }

    async fn get_power_strategy(&self) -> Result<PowerStrategy> {
        self.strategy.lock().unwrap().parse()
    }

    async fn get_dynamic_schedule(&self, date: NaiveDate) -> Result<DaySchedule> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        self.schedule.clone().ok_or_else(|| {
            SessyError::schedule("power_strategy".to_string(), date.to_string())
        })
    }

    async fn set_strategy(&self, strategy: PowerStrategy) -> Result<()> {
        self.maybe_reject()?;
        self.sent
            .lock()
            .unwrap()
            .push(format!("strategy {}", strategy));
        Ok(())
    }

    async fn set_power_setpoint(&self, setpoint: i64) -> Result<()> {
        self.maybe_reject()?;
        self.sent
            .lock()
            .unwrap()
            .push(format!("setpoint {}", setpoint));
        Ok(())
    }

    async fn get_p1_details(&self) -> Result<P1Details> {
        self.p1_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.p1.clone())
    }
}

/// Hands out pre-built fakes by device name
#[derive(Default)]
pub struct FakeConnector {
    devices: HashMap<String, Arc<FakeSessy>>,
}

impl FakeConnector {
    pub fn with(mut self, fake: FakeSessy) -> Self {
        self.devices.insert(fake.name.clone(), Arc::new(fake));
        self
    }

    pub fn get(&self, name: &str) -> Arc<FakeSessy> {
        self.devices[name].clone()
    }

    /// Device file listing every fake; names starting with "P1" are meters
    pub fn device_file(&self) -> DeviceFile {
        let mut names: Vec<&String> = self.devices.keys().collect();
        names.sort();
        let mut file = DeviceFile::default();
        for name in names {
            let device = DeviceConfig {
                name: name.clone(),
                ip: "127.0.0.1".to_string(),
                user: "user".to_string(),
                pwd: "pwd".to_string(),
            };
            if name.starts_with("P1") {
                file.p1meter.push(device);
            } else {
                file.batteries.push(device);
            }
        }
        file
    }
}

impl Connector for FakeConnector {
    fn connect(&self, device: &DeviceConfig) -> Result<Arc<dyn SessyApi>> {
        let fake: Arc<dyn SessyApi> = self
            .devices
            .get(&device.name)
            .cloned()
            .ok_or_else(|| SessyError::config(format!("no fake for {}", device.name)))?;
        Ok(fake)
    }
}

/// Default plugin settings; backoff runs on paused time
pub fn settings() -> PluginConfig {
    PluginConfig::default()
}
