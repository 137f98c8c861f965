//! Vendor enums and their host ordinal codes

use crate::error::{Result, SessyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selector level shown when batteries disagree on their strategy
pub const MIXED_LEVEL: u32 = 0;

/// Sessy power strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PowerStrategy {
    /// Zero net on meter
    Nom,
    /// Dynamic pricing
    Roi,
    /// Setpoint controlled through the local API
    Api,
    /// Battery does nothing
    Idle,
    /// Controlled by the Sessy cloud
    SessyConnect,
    /// Eco mode
    Eco,
}

impl PowerStrategy {
    pub const ALL: [PowerStrategy; 6] = [
        PowerStrategy::Nom,
        PowerStrategy::Roi,
        PowerStrategy::Api,
        PowerStrategy::Idle,
        PowerStrategy::SessyConnect,
        PowerStrategy::Eco,
    ];

    /// String used on the wire
    pub const fn as_vendor_str(self) -> &'static str {
        match self {
            PowerStrategy::Nom => "POWER_STRATEGY_NOM",
            PowerStrategy::Roi => "POWER_STRATEGY_ROI",
            PowerStrategy::Api => "POWER_STRATEGY_API",
            PowerStrategy::Idle => "POWER_STRATEGY_IDLE",
            PowerStrategy::SessyConnect => "POWER_STRATEGY_SESSY_CONNECT",
            PowerStrategy::Eco => "POWER_STRATEGY_ECO",
        }
    }

    /// Selector level on the host
    pub const fn level(self) -> u32 {
        match self {
            PowerStrategy::Nom => 10,
            PowerStrategy::Roi => 20,
            PowerStrategy::Api => 30,
            PowerStrategy::Idle => 40,
            PowerStrategy::SessyConnect => 50,
            PowerStrategy::Eco => 60,
        }
    }

    /// Label shown next to the selector level
    pub const fn label(self) -> &'static str {
        match self {
            PowerStrategy::Nom => "Zero net",
            PowerStrategy::Roi => "Dynamic",
            PowerStrategy::Api => "API",
            PowerStrategy::Idle => "Idle",
            PowerStrategy::SessyConnect => "Sessy Connect",
            PowerStrategy::Eco => "Eco",
        }
    }

    /// Decode a selector level; the mixed sentinel is not a strategy
    pub fn from_level(level: i64) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| i64::from(s.level()) == level)
            .ok_or_else(|| SessyError::unknown_strategy(format!("level {}", level)))
    }

    /// Selector levels and labels, mixed first
    pub fn selector_levels() -> Vec<(u32, String)> {
        std::iter::once((MIXED_LEVEL, "Mixed".to_string()))
            .chain(Self::ALL.iter().map(|s| (s.level(), s.label().to_string())))
            .collect()
    }
}

impl FromStr for PowerStrategy {
    type Err = SessyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_vendor_str() == s)
            .ok_or_else(|| SessyError::unknown_strategy(s))
    }
}

impl TryFrom<String> for PowerStrategy {
    type Error = SessyError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PowerStrategy> for String {
    fn from(value: PowerStrategy) -> Self {
        value.as_vendor_str().to_string()
    }
}

impl fmt::Display for PowerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_vendor_str())
    }
}

/// Cross-battery strategy agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyConsensus {
    /// Nothing folded in yet
    #[default]
    Empty,
    /// Every battery so far reports this strategy
    Uniform(PowerStrategy),
    /// Batteries disagree, or one reported something unknown
    Mixed,
}

impl StrategyConsensus {
    /// Fold one battery's strategy; `None` means it could not be decoded
    #[must_use]
    pub fn fold(self, strategy: Option<PowerStrategy>) -> Self {
        match (self, strategy) {
            (_, None) | (StrategyConsensus::Mixed, _) => StrategyConsensus::Mixed,
            (StrategyConsensus::Empty, Some(s)) => StrategyConsensus::Uniform(s),
            (StrategyConsensus::Uniform(current), Some(s)) if current == s => self,
            (StrategyConsensus::Uniform(_), Some(_)) => StrategyConsensus::Mixed,
        }
    }

    /// Selector level for the system device
    pub const fn level(self) -> u32 {
        match self {
            StrategyConsensus::Uniform(s) => s.level(),
            StrategyConsensus::Empty | StrategyConsensus::Mixed => MIXED_LEVEL,
        }
    }
}

/// Host switch text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    Off,
    On,
}

impl SwitchState {
    /// Ordinal stored as the host nValue
    pub const fn ordinal(self) -> i64 {
        match self {
            SwitchState::Off => 0,
            SwitchState::On => 1,
        }
    }
}

impl FromStr for SwitchState {
    type Err = SessyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "true" => Ok(SwitchState::On),
            "off" | "false" => Ok(SwitchState::Off),
            _ => Err(SessyError::unknown_switch_state(s)),
        }
    }
}
