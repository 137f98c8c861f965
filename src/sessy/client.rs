use crate::config::DeviceConfig;
use crate::error::{Result, SessyError};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::strategy::PowerStrategy;
use super::types::{
    ActiveStrategy, DaySchedule, DynamicSchedule, EnergyStatus, P1Details, PowerStatus,
    SetpointBody, StrategyBody, VendorError,
};

const POWER_STATUS: &str = "api/v1/power/status";
const ENERGY_STATUS: &str = "api/v1/energy/status";
const ACTIVE_STRATEGY: &str = "api/v1/power/active_strategy";
const POWER_SETPOINT: &str = "api/v1/power/setpoint";
const DYNAMIC_SCHEDULE: &str = "api/v1/dynamic/schedule";
const P1_DETAILS: &str = "api/v1/p1/details";

/// Calls the plugin makes against one Sessy device
#[async_trait]
pub trait SessyApi: Send + Sync {
    /// Configured device name
    fn name(&self) -> &str;

    async fn get_power_status(&self) -> Result<PowerStatus>;

    async fn get_energy_status(&self) -> Result<EnergyStatus>;

    async fn get_power_strategy(&self) -> Result<PowerStrategy>;

    /// Schedule and prices for `date`
    async fn get_dynamic_schedule(&self, date: NaiveDate) -> Result<DaySchedule>;

    async fn set_strategy(&self, strategy: PowerStrategy) -> Result<()>;

    /// Requested power in W; negative charges
    async fn set_power_setpoint(&self, setpoint: i64) -> Result<()>;

    async fn get_p1_details(&self) -> Result<P1Details>;
}

/// HTTP client for the Sessy local API
pub struct SessyClient {
    name: String,
    base_url: String,
    user: String,
    pwd: String,
    http: reqwest::Client,
    logger: StructuredLogger,
}

impl SessyClient {
    /// Create a client for one configured device
    pub fn new(device: &DeviceConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessyError::config(format!("Failed to build HTTP client: {}", e)))?;
        let logger = get_logger_with_context(
            LogContext::new("sessy")
                .with_device_id(&device.name)
                .with_field("ip", device.ip.clone()),
        );
        Ok(Self {
            name: device.name.clone(),
            base_url: format!("http://{}/", device.ip.trim_end_matches('/')),
            user: device.user.clone(),
            pwd: device.pwd.clone(),
            http,
            logger,
        })
    }

    /// Base URL every path is joined onto
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.logger.trace(&format!("GET {}", url));
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.user, Some(&self.pwd))
            .send()
            .await?;
        let body = Self::checked_body(response).await?;
        Self::decode(&body)
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        self.logger.debug(&format!("POST {}", url));
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.user, Some(&self.pwd))
            .json(body)
            .send()
            .await?;
        let body = Self::checked_body(response).await?;
        // Some firmware answers an empty body
        if !body.trim().is_empty() {
            Self::decode::<serde_json::Value>(&body)?;
        }
        Ok(())
    }

    /// Read the body, turning anything but 200 into a request error
    async fn checked_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(SessyError::request(status.as_u16(), vendor_message(&body)));
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| SessyError::request(200, format!("Malformed JSON: {}", e)))?;
        if let Some(status) = value.get("status").and_then(|s| s.as_str())
            && status != "ok"
        {
            return Err(SessyError::request(200, vendor_message(body)));
        }
        serde_json::from_value(value)
            .map_err(|e| SessyError::request(200, format!("Unexpected response: {}", e)))
    }
}

/// Vendor error string, or the raw body when it has none
fn vendor_message(body: &str) -> String {
    serde_json::from_str::<VendorError>(body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl SessyApi for SessyClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_power_status(&self) -> Result<PowerStatus> {
        self.get_json(POWER_STATUS).await
    }

    async fn get_energy_status(&self) -> Result<EnergyStatus> {
        self.get_json(ENERGY_STATUS).await
    }

    async fn get_power_strategy(&self) -> Result<PowerStrategy> {
        let active: ActiveStrategy = self.get_json(ACTIVE_STRATEGY).await?;
        active.strategy.parse()
    }

    async fn get_dynamic_schedule(&self, date: NaiveDate) -> Result<DaySchedule> {
        let schedule: DynamicSchedule = self.get_json(DYNAMIC_SCHEDULE).await?;
        schedule.for_date(date)
    }

    async fn set_strategy(&self, strategy: PowerStrategy) -> Result<()> {
        self.logger.info(&format!("Setting strategy {}", strategy));
        self.post_json(ACTIVE_STRATEGY, &StrategyBody { strategy }).await
    }

    async fn set_power_setpoint(&self, setpoint: i64) -> Result<()> {
        self.logger.info(&format!("Setting power setpoint {} W", setpoint));
        self.post_json(POWER_SETPOINT, &SetpointBody { setpoint }).await
    }

    async fn get_p1_details(&self) -> Result<P1Details> {
        self.get_json(P1_DETAILS).await
    }
}
