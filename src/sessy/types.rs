//! Payloads of the Sessy local API

use crate::error::{Result, SessyError};
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::strategy::PowerStrategy;

/// `GET api/v1/power/status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerStatus {
    pub sessy: SessyPower,
    #[serde(default)]
    pub renewable_energy_phase1: Option<PhasePower>,
    #[serde(default)]
    pub renewable_energy_phase2: Option<PhasePower>,
    #[serde(default)]
    pub renewable_energy_phase3: Option<PhasePower>,
}

/// Battery part of the power status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessyPower {
    /// Fraction 0..1
    pub state_of_charge: f64,
    /// Watts; negative is charging
    pub power: i64,
    /// Watts requested through the API strategy
    pub power_setpoint: i64,
    #[serde(default)]
    pub system_state: String,
    #[serde(default)]
    pub system_state_details: String,
    /// Grid frequency in mHz
    #[serde(default)]
    pub frequency: i64,
}

/// Per-phase grid measurement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasePower {
    /// mV
    pub voltage_rms: i64,
    /// mA
    pub current_rms: i64,
    /// W
    pub power: i64,
}

/// `GET api/v1/energy/status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnergyStatus {
    pub sessy_energy: EnergyCounters,
}

/// Cumulative battery energy counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyCounters {
    /// Energy taken into the battery
    pub import_wh: f64,
    /// Energy delivered by the battery
    pub export_wh: f64,
}

/// `GET api/v1/power/active_strategy`
///
/// Kept as the raw vendor string; parsed by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveStrategy {
    pub strategy: String,
}

/// `POST api/v1/power/active_strategy`
#[derive(Debug, Clone, Serialize)]
pub struct StrategyBody {
    pub strategy: PowerStrategy,
}

/// `POST api/v1/power/setpoint`
#[derive(Debug, Clone, Serialize)]
pub struct SetpointBody {
    pub setpoint: i64,
}

/// `GET api/v1/p1/details`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct P1Details {
    pub state: String,
    pub dsmr_version: u32,
    /// Active tariff, 1 or 2
    pub tariff_indicator: u8,
    /// Net power in W; negative is returning to the grid
    pub power_total: i64,
    pub power_consumed_l1: i64,
    pub power_consumed_l2: i64,
    pub power_consumed_l3: i64,
    pub power_produced_l1: i64,
    pub power_produced_l2: i64,
    pub power_produced_l3: i64,
    /// Cumulative Wh per tariff
    pub power_consumed_tariff1: f64,
    pub power_consumed_tariff2: f64,
    pub power_produced_tariff1: f64,
    pub power_produced_tariff2: f64,
}

impl P1Details {
    /// Instantaneous consumption in W
    pub fn consumed_w(&self) -> i64 {
        let phases = self.power_consumed_l1 + self.power_consumed_l2 + self.power_consumed_l3;
        if phases > 0 { phases } else { self.power_total.max(0) }
    }

    /// Instantaneous production in W
    pub fn produced_w(&self) -> i64 {
        let phases = self.power_produced_l1 + self.power_produced_l2 + self.power_produced_l3;
        if phases > 0 { phases } else { (-self.power_total).max(0) }
    }
}

/// Error body the Sessy API sends with non-200 answers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VendorError {
    pub status: String,
    pub error: Option<String>,
}

/// `GET api/v1/dynamic/schedule`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicSchedule {
    #[serde(default)]
    pub power_strategy: Option<Vec<DailyPower>>,
    #[serde(default)]
    pub energy_prices: Option<Vec<DailyPrices>>,
}

/// Planned battery power for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPower {
    pub date: NaiveDate,
    #[serde(default)]
    pub power: Vec<i64>,
}

/// Energy prices for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPrices {
    pub date: NaiveDate,
    #[serde(default)]
    pub price: Vec<f64>,
}

/// Schedule and prices of a single date
#[derive(Debug, Clone, PartialEq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub power: Vec<i64>,
    pub prices: Vec<f64>,
}

impl DynamicSchedule {
    /// Pick the given date out of the schedule
    ///
    /// Fails with a schedule error when either element is absent or has no
    /// non-empty entry for the date.
    pub fn for_date(&self, date: NaiveDate) -> Result<DaySchedule> {
        let date_string = date.format("%Y-%m-%d").to_string();

        let power = self
            .power_strategy
            .as_ref()
            .and_then(|days| days.iter().find(|d| d.date == date))
            .filter(|d| !d.power.is_empty())
            .ok_or_else(|| SessyError::schedule("power_strategy", date_string.as_str()))?;

        let prices = self
            .energy_prices
            .as_ref()
            .and_then(|days| days.iter().find(|d| d.date == date))
            .filter(|d| !d.price.is_empty())
            .ok_or_else(|| SessyError::schedule("energy_prices", date_string.as_str()))?;

        Ok(DaySchedule {
            date,
            power: power.power.clone(),
            prices: prices.price.clone(),
        })
    }
}

impl DaySchedule {
    /// Planned power and price for the slot containing `time`
    ///
    /// Slots divide the day evenly, so hourly and quarter-hourly lists both
    /// work.
    pub fn at(&self, time: NaiveTime) -> (Option<i64>, Option<f64>) {
        let secs = u64::from(time.num_seconds_from_midnight());
        let slot = |len: usize| -> usize { (secs * len as u64 / 86_400) as usize };
        (
            self.power.get(slot(self.power.len())).copied(),
            self.prices.get(slot(self.prices.len())).copied(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_status_parses() {
        // language=json
        let body = r#"{
            "status": "ok",
            "sessy": {
                "state_of_charge": 0.512,
                "power": -1200,
                "power_setpoint": -1200,
                "system_state": "SYSTEM_STATE_RUNNING_SAFE",
                "system_state_details": "",
                "frequency": 50012,
                "inverter_current_ma": 0
            },
            "renewable_energy_phase1": {"voltage_rms": 231000, "current_rms": 5200, "power": 1201},
            "renewable_energy_phase2": {"voltage_rms": 0, "current_rms": 0, "power": 0},
            "renewable_energy_phase3": {"voltage_rms": 0, "current_rms": 0, "power": 0}
        }"#;
        let status: PowerStatus = serde_json::from_str(body).unwrap();
        assert!((status.sessy.state_of_charge - 0.512).abs() < 1e-9);
        assert_eq!(status.sessy.power, -1200);
        assert_eq!(status.sessy.system_state, "SYSTEM_STATE_RUNNING_SAFE");
        assert_eq!(status.renewable_energy_phase1.unwrap().power, 1201);
    }

    #[test]
    fn energy_status_parses() {
        let body = r#"{"status":"ok","sessy_energy":{"import_wh":31234,"export_wh":27001}}"#;
        let status: EnergyStatus = serde_json::from_str(body).unwrap();
        assert!((status.sessy_energy.import_wh - 31234.0).abs() < 1e-9);
        assert!((status.sessy_energy.export_wh - 27001.0).abs() < 1e-9);
    }

    #[test]
    fn p1_power_split() {
        let p1 = P1Details {
            power_total: -450,
            ..Default::default()
        };
        assert_eq!(p1.consumed_w(), 0);
        assert_eq!(p1.produced_w(), 450);

        let p1 = P1Details {
            power_total: 300,
            power_consumed_l1: 200,
            power_consumed_l2: 100,
            ..Default::default()
        };
        assert_eq!(p1.consumed_w(), 300);
        assert_eq!(p1.produced_w(), 0);
    }

    fn schedule_json() -> &'static str {
        r#"{
            "status": "ok",
            "power_strategy": [
                {"date": "2024-05-01", "power": [0, 0, -2200, -2200, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1700, 1700, 0, 0, 0, 0]},
                {"date": "2024-05-02", "power": []}
            ],
            "energy_prices": [
                {"date": "2024-05-01", "price": [0.21, 0.20, 0.18, 0.17, 0.19, 0.22, 0.25, 0.28, 0.27, 0.24, 0.20, 0.19, 0.18, 0.18, 0.19, 0.21, 0.25, 0.30, 0.34, 0.33, 0.29, 0.26, 0.24, 0.22]}
            ]
        }"#
    }

    #[test]
    fn schedule_for_date() {
        let schedule: DynamicSchedule = serde_json::from_str(schedule_json()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let day = schedule.for_date(date).unwrap();
        assert_eq!(day.power.len(), 24);

        let (power, price) = day.at(NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(power, Some(1700));
        assert!((price.unwrap() - 0.34).abs() < 1e-9);
    }

    #[test]
    fn schedule_missing_elements() {
        let schedule: DynamicSchedule = serde_json::from_str(schedule_json()).unwrap();

        let empty_day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let err = schedule.for_date(empty_day).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing schedule information 'power_strategy' for 2024-05-02"
        );

        let no_prices: DynamicSchedule = serde_json::from_str(
            r#"{"power_strategy": [{"date": "2024-05-01", "power": [1]}]}"#,
        )
        .unwrap();
        let err = no_prices
            .for_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .unwrap_err();
        assert!(matches!(err, SessyError::Schedule { ref element, .. } if element == "energy_prices"));
    }
}
