//! Configuration management for Sessy Bridge
//!
//! Two files feed the bridge. The adapter configuration is YAML and covers
//! logging, the HTTP command API and the plugin's timing options. The device
//! file is JSON and lists the Sessy batteries and P1 dongles to poll; it is
//! read once at startup and never changes while the plugin runs.

use crate::error::{Result, SessyError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,

    /// Polling and retry behaviour of the plugin
    pub plugin: PluginConfig,

    /// File where the standalone host keeps its device store
    pub persistence_file: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE..ERROR, or the host modes Verbose/Debug/Normal)
    pub level: String,

    /// Path to log file or log directory
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Whether the command API is served at all
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

/// Plugin options that a host would normally hand over as parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// JSON file with the batteries and P1 dongles
    pub devices_file: String,

    /// Seconds between heartbeat ticks
    pub heartbeat_seconds: u64,

    /// Run a poll pass every N heartbeats
    pub refresh_ticks: u32,

    /// Poll the P1 meter and dynamic schedule every N heartbeats
    pub p1_interval_ticks: u32,

    /// Attempts per vendor call before giving up
    pub retry_attempts: u32,

    /// Backoff unit; attempt i waits i^3 times this
    pub retry_base_delay_ms: u64,

    /// Per-request HTTP timeout
    pub request_timeout_ms: u64,
}

/// One Sessy battery or P1 dongle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Display name, also used as the host device id
    pub name: String,

    /// IP address or host name on the local network
    pub ip: String,

    /// Local API user (printed on the device sticker)
    pub user: String,

    /// Local API password
    pub pwd: String,
}

/// Contents of the device file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceFile {
    /// Batteries to poll
    #[serde(default)]
    pub batteries: Vec<DeviceConfig>,

    /// P1 dongles to poll
    #[serde(default)]
    pub p1meter: Vec<DeviceConfig>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "sessy_config.yaml",
            "/data/sessy_config.yaml",
            "/etc/sessy/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.plugin.devices_file.trim().is_empty() {
            return Err(SessyError::validation(
                "plugin.devices_file",
                "Path cannot be empty",
            ));
        }

        if self.plugin.heartbeat_seconds == 0 {
            return Err(SessyError::validation(
                "plugin.heartbeat_seconds",
                "Must be greater than 0",
            ));
        }

        if self.plugin.refresh_ticks == 0 {
            return Err(SessyError::validation(
                "plugin.refresh_ticks",
                "Must be greater than 0",
            ));
        }

        if self.plugin.p1_interval_ticks == 0 {
            return Err(SessyError::validation(
                "plugin.p1_interval_ticks",
                "Must be greater than 0",
            ));
        }

        if self.plugin.retry_attempts == 0 {
            return Err(SessyError::validation(
                "plugin.retry_attempts",
                "Must be greater than 0",
            ));
        }

        if self.web.enabled && self.web.port == 0 {
            return Err(SessyError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl DeviceFile {
    /// Read and validate the device file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SessyError::config(format!(
                "Cannot read device file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate device file contents
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: DeviceFile = serde_json::from_str(contents)
            .map_err(|e| SessyError::config(format!("Malformed device file: {}", e)))?;
        file.validate()?;
        Ok(file)
    }

    /// Check names and addresses
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for device in self.batteries.iter().chain(self.p1meter.iter()) {
            if device.name.trim().is_empty() {
                return Err(SessyError::validation("name", "Device name cannot be empty"));
            }
            if device.ip.trim().is_empty() {
                return Err(SessyError::validation(
                    device.name.as_str(),
                    "IP address cannot be empty",
                ));
            }
            if device.name == crate::host::SYSTEM_DEVICE_ID {
                return Err(SessyError::validation(
                    device.name.as_str(),
                    "Name is reserved for the system device",
                ));
            }
            if !seen.insert(device.name.as_str()) {
                return Err(SessyError::validation(
                    device.name.as_str(),
                    "Duplicate device name",
                ));
            }
        }
        Ok(())
    }
}
