//! Standalone host for the plugin
//!
//! [`BridgeRuntime`] owns a plugin instance together with an in-memory
//! device store and its persistence. The adapter binary and the web API
//! share one runtime behind a mutex, so callbacks never overlap.

use crate::config::{Config, DeviceFile};
use crate::error::Result;
use crate::host::{HostDevice, MemoryHost};
use crate::logging::{StructuredLogger, get_logger};
use crate::persistence::PersistenceManager;
use crate::plugin::{Connector, HttpConnector, PluginState, SessyPlugin};
use std::sync::Arc;
use std::time::Duration;

pub struct BridgeRuntime {
    plugin: SessyPlugin,
    host: MemoryHost,
    persistence: Option<PersistenceManager>,
    default_heartbeat: Duration,
    logger: StructuredLogger,
}

impl BridgeRuntime {
    pub fn new(
        plugin: SessyPlugin,
        host: MemoryHost,
        persistence: Option<PersistenceManager>,
        default_heartbeat: Duration,
    ) -> Self {
        Self {
            plugin,
            host,
            persistence,
            default_heartbeat,
            logger: get_logger("runtime"),
        }
    }

    /// Runtime talking to real devices, with the store restored from disk
    pub fn from_config(config: &Config) -> Result<Self> {
        let connector: Arc<dyn Connector> = Arc::new(HttpConnector::new(Duration::from_millis(
            config.plugin.request_timeout_ms,
        )));
        let persistence = PersistenceManager::new(&config.persistence_file);
        let host = MemoryHost::from_devices(persistence.load()?);
        Ok(Self::new(
            SessyPlugin::new(config.plugin.clone(), connector),
            host,
            Some(persistence),
            Duration::from_secs(config.plugin.heartbeat_seconds),
        ))
    }

    pub fn plugin(&self) -> &SessyPlugin {
        &self.plugin
    }

    pub fn host(&self) -> &MemoryHost {
        &self.host
    }

    pub fn devices(&self) -> Vec<HostDevice> {
        self.host.devices()
    }

    pub fn state(&self) -> &PluginState {
        self.plugin.state()
    }

    /// Interval the plugin asked for, or the configured default
    pub fn heartbeat_interval(&self) -> Duration {
        self.host
            .heartbeat_seconds()
            .map(Duration::from_secs)
            .unwrap_or(self.default_heartbeat)
            .max(Duration::from_secs(1))
    }

    pub fn start(&mut self) -> Result<()> {
        let result = self.plugin.on_start(&mut self.host);
        self.persist();
        result
    }

    pub fn start_with_devices(&mut self, devices: DeviceFile) -> Result<()> {
        let result = self.plugin.start_with_devices(&mut self.host, devices);
        self.persist();
        result
    }

    pub async fn heartbeat(&mut self) -> Result<()> {
        let result = self.plugin.on_heartbeat(&mut self.host).await;
        self.persist();
        result
    }

    pub async fn command(&mut self, device_id: &str, unit: u8, command: &str, level: f64) -> Result<()> {
        self.plugin.on_command(device_id, unit, command, level).await
    }

    pub fn stop(&mut self) {
        self.plugin.on_stop();
        self.persist();
    }

    fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(e) = persistence.save(self.host.devices()) {
            self.logger
                .warn(&format!("Failed to persist device store: {}", e));
        }
    }
}
