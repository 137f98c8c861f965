//! Cumulative energy counter derived from power samples
//!
//! The host stores the counter as `"power;cumulative_wh"` together with the
//! time of the last update. Each poll integrates the average of the previous
//! and current power over the elapsed time and writes the pair back.

use chrono::{DateTime, Utc};

use crate::host::StoredValue;

/// Power sample and cumulative energy as kept by the host
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyCounter {
    /// Last displayed power in W
    pub power: f64,
    /// Cumulative energy in Wh
    pub wh: f64,
}

impl EnergyCounter {
    /// Parse a stored `"power;wh"` value; missing or unparseable fields are zero
    pub fn parse(s_value: &str) -> Self {
        let mut parts = s_value.split(';');
        let mut field = || {
            parts
                .next()
                .and_then(|p| p.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        };
        let power = field();
        let wh = field();
        Self { power, wh }
    }

    /// Host encoding
    pub fn to_s_value(&self) -> String {
        format!("{:.1};{:.3}", self.power, self.wh)
    }

    /// Trapezoidal integration of one interval, added to `prev_wh`
    pub fn integrate(prev_power: f64, prev_wh: f64, elapsed_secs: f64, curr_power: f64) -> f64 {
        let elapsed = elapsed_secs.max(0.0);
        let new_wh = ((prev_power + curr_power) / 2.0) * elapsed / 3600.0;
        prev_wh + new_wh
    }

    /// Next counter state from the host's previous value
    ///
    /// Power is clamped at zero so the counter never decreases.
    pub fn advance(previous: Option<&StoredValue>, now: DateTime<Utc>, curr_power: f64) -> Self {
        let curr_power = curr_power.max(0.0);
        let Some(previous) = previous else {
            return Self {
                power: curr_power,
                wh: 0.0,
            };
        };
        let prev = Self::parse(&previous.s_value);
        let elapsed = (now - previous.last_update).num_milliseconds() as f64 / 1000.0;
        Self {
            power: curr_power,
            wh: Self::integrate(prev.power.max(0.0), prev.wh, elapsed, curr_power),
        }
    }
}
