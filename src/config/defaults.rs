use super::*;

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/sessy-bridge.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            devices_file: "sessy_devices.json".to_string(),
            heartbeat_seconds: 10,
            refresh_ticks: 1,
            p1_interval_ticks: 10,
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
            plugin: PluginConfig::default(),
            persistence_file: "/data/sessy_devices_state.json".to_string(),
        }
    }
}
