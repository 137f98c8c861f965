use crate::sessy::{EnergyStatus, PowerStatus, PowerStrategy, StrategyConsensus};

/// One battery's values after a successful poll
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatteryReading {
    /// 0..100
    pub state_of_charge: f64,
    /// W; negative is charging
    pub power: i64,
    pub setpoint: i64,
    pub system_state: String,
    pub import_wh: f64,
    pub export_wh: f64,
}

impl BatteryReading {
    pub fn from_status(power: &PowerStatus, energy: &EnergyStatus) -> Self {
        Self {
            state_of_charge: power.sessy.state_of_charge * 100.0,
            power: power.sessy.power,
            setpoint: power.sessy.power_setpoint,
            system_state: power.sessy.system_state.clone(),
            import_wh: energy.sessy_energy.import_wh,
            export_wh: energy.sessy_energy.export_wh,
        }
    }

    /// Power flowing into the battery, W
    pub fn charge_power(&self) -> f64 {
        (-self.power).max(0) as f64
    }

    /// Power flowing out of the battery, W
    pub fn discharge_power(&self) -> f64 {
        self.power.max(0) as f64
    }
}

/// System-wide totals, built fresh for every poll pass
#[derive(Debug, Clone, Default)]
pub struct SystemAggregate {
    batteries: usize,
    state_of_charge_sum: f64,
    power: i64,
    setpoint: i64,
    import_wh: f64,
    export_wh: f64,
    charge_power: f64,
    discharge_power: f64,
    strategy: StrategyConsensus,
}

impl SystemAggregate {
    /// Add one battery's contribution
    pub fn add(&mut self, reading: &BatteryReading) {
        self.batteries += 1;
        self.state_of_charge_sum += reading.state_of_charge;
        self.power += reading.power;
        self.setpoint += reading.setpoint;
        self.import_wh += reading.import_wh;
        self.export_wh += reading.export_wh;
        self.charge_power += reading.charge_power();
        self.discharge_power += reading.discharge_power();
    }

    /// Fold one battery's strategy; `None` when it could not be decoded
    pub fn fold_strategy(&mut self, strategy: Option<PowerStrategy>) {
        self.strategy = self.strategy.fold(strategy);
    }

    pub fn batteries(&self) -> usize {
        self.batteries
    }

    /// Average state of charge; `None` without batteries
    pub fn state_of_charge(&self) -> Option<f64> {
        (self.batteries > 0).then(|| self.state_of_charge_sum / self.batteries as f64)
    }

    pub fn power(&self) -> i64 {
        self.power
    }

    pub fn setpoint(&self) -> i64 {
        self.setpoint
    }

    pub fn import_wh(&self) -> f64 {
        self.import_wh
    }

    pub fn export_wh(&self) -> f64 {
        self.export_wh
    }

    pub fn charge_power(&self) -> f64 {
        self.charge_power
    }

    pub fn discharge_power(&self) -> f64 {
        self.discharge_power
    }

    pub fn strategy(&self) -> StrategyConsensus {
        self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessy::MIXED_LEVEL;

    fn reading(soc: f64, power: i64) -> BatteryReading {
        BatteryReading {
            state_of_charge: soc,
            power,
            setpoint: power,
            system_state: "SYSTEM_STATE_RUNNING_SAFE".to_string(),
            import_wh: 1000.0,
            export_wh: 800.0,
        }
    }

    #[test]
    fn average_state_of_charge() {
        let mut agg = SystemAggregate::default();
        assert_eq!(agg.state_of_charge(), None);
        agg.add(&reading(50.0, 0));
        agg.add(&reading(70.0, 0));
        assert!((agg.state_of_charge().unwrap() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn sums_power_setpoint_and_energy() {
        let mut agg = SystemAggregate::default();
        agg.add(&reading(50.0, -1200));
        agg.add(&reading(70.0, 400));
        assert_eq!(agg.power(), -800);
        assert_eq!(agg.setpoint(), -800);
        assert_eq!(agg.import_wh(), 2000.0);
        assert_eq!(agg.export_wh(), 1600.0);
        assert_eq!(agg.charge_power(), 1200.0);
        assert_eq!(agg.discharge_power(), 400.0);
        assert_eq!(agg.batteries(), 2);
    }

    #[test]
    fn strategy_consensus() {
        let mut agg = SystemAggregate::default();
        agg.fold_strategy(Some(PowerStrategy::Roi));
        agg.fold_strategy(Some(PowerStrategy::Roi));
        assert_eq!(agg.strategy().level(), PowerStrategy::Roi.level());

        agg.fold_strategy(Some(PowerStrategy::Idle));
        assert_eq!(agg.strategy().level(), MIXED_LEVEL);
    }

    #[test]
    fn reading_from_vendor_payloads() {
        let power: PowerStatus = serde_json::from_str(
            r#"{"status":"ok","sessy":{"state_of_charge":0.5,"power":-250,"power_setpoint":-250,"system_state":"SYSTEM_STATE_RUNNING_SAFE"}}"#,
        )
        .unwrap();
        let energy: EnergyStatus =
            serde_json::from_str(r#"{"status":"ok","sessy_energy":{"import_wh":10,"export_wh":5}}"#)
                .unwrap();
        let r = BatteryReading::from_status(&power, &energy);
        assert!((r.state_of_charge - 50.0).abs() < 1e-9);
        assert_eq!(r.charge_power(), 250.0);
        assert_eq!(r.discharge_power(), 0.0);
        assert_eq!(r.import_wh, 10.0);
    }
}
