use super::aggregate::{BatteryReading, SystemAggregate};
use super::devices::*;
use super::{Endpoint, SessyPlugin};
use crate::energy::EnergyCounter;
use crate::error::{Result, SessyError};
use crate::host::{DeviceUpdate, Host, SYSTEM_DEVICE_ID};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::sessy::{DaySchedule, P1Details, SwitchState};
use chrono::Local;

fn device_logger(component: &str, endpoint: &Endpoint) -> StructuredLogger {
    get_logger_with_context(LogContext::new(component).with_device_id(&endpoint.config.name))
}

/// Write an accumulated counter unit from the current power
fn advance_counter(host: &mut dyn Host, device_id: &str, unit: u8, power: f64) -> Result<()> {
    let previous = host.stored_value(device_id, unit);
    let counter = EnergyCounter::advance(previous.as_ref(), host.now(), power);
    host.update_device(device_id, unit, DeviceUpdate::text(counter.to_s_value()))
}

/// Values shared by battery and system devices
struct CommonValues {
    state_of_charge: f64,
    power: i64,
    setpoint: i64,
    charge_power: f64,
    discharge_power: f64,
    import_wh: f64,
    export_wh: f64,
}

impl CommonValues {
    fn from_reading(reading: &BatteryReading) -> Self {
        Self {
            state_of_charge: reading.state_of_charge,
            power: reading.power,
            setpoint: reading.setpoint,
            charge_power: reading.charge_power(),
            discharge_power: reading.discharge_power(),
            import_wh: reading.import_wh,
            export_wh: reading.export_wh,
        }
    }

    fn from_aggregate(aggregate: &SystemAggregate, state_of_charge: f64) -> Self {
        Self {
            state_of_charge,
            power: aggregate.power(),
            setpoint: aggregate.setpoint(),
            charge_power: aggregate.charge_power(),
            discharge_power: aggregate.discharge_power(),
            import_wh: aggregate.import_wh(),
            export_wh: aggregate.export_wh(),
        }
    }

    fn write(&self, host: &mut dyn Host, device_id: &str) -> Result<()> {
        host.update_device(
            device_id,
            UNIT_STATE_OF_CHARGE,
            DeviceUpdate {
                n_value: self.state_of_charge.round() as i64,
                s_value: format!("{:.1}", self.state_of_charge),
            },
        )?;
        host.update_device(device_id, UNIT_POWER, DeviceUpdate::text(self.power.to_string()))?;
        advance_counter(host, device_id, UNIT_CHARGED, self.charge_power)?;
        advance_counter(host, device_id, UNIT_DISCHARGED, self.discharge_power)?;
        // A zero setpoint shows as switched off
        let switch = if self.setpoint == 0 {
            SwitchState::Off
        } else {
            SwitchState::On
        };
        host.update_device(
            device_id,
            UNIT_SETPOINT,
            DeviceUpdate {
                n_value: switch.ordinal(),
                s_value: self.setpoint.to_string(),
            },
        )?;

        let stored = EnergyCounter {
            power: self.charge_power,
            wh: self.import_wh,
        };
        let delivered = EnergyCounter {
            power: self.discharge_power,
            wh: self.export_wh,
        };
        host.update_device(
            device_id,
            UNIT_ENERGY_STORED,
            DeviceUpdate::text(stored.to_s_value()),
        )?;
        host.update_device(
            device_id,
            UNIT_ENERGY_DELIVERED,
            DeviceUpdate::text(delivered.to_s_value()),
        )
    }
}

/// `"usage1;usage2;return1;return2;cons;prod"`
pub(crate) fn smart_meter_value(details: &P1Details) -> String {
    format!(
        "{};{};{};{};{};{}",
        details.power_consumed_tariff1.round() as i64,
        details.power_consumed_tariff2.round() as i64,
        details.power_produced_tariff1.round() as i64,
        details.power_produced_tariff2.round() as i64,
        details.consumed_w(),
        details.produced_w()
    )
}

/// Text for the system schedule unit
pub(crate) fn schedule_text(power: Option<i64>, price: Option<f64>) -> String {
    let price = price.map_or_else(|| "-".to_string(), |p| format!("{:.3}", p));
    let power = power.map_or_else(|| "-".to_string(), |p| p.to_string());
    format!("Price {} / planned {} W", price, power)
}

impl SessyPlugin {
    /// One full pass over all batteries plus the system device
    ///
    /// The aggregate only reaches the host when every battery answered.
    pub(super) async fn poll_batteries(&self, host: &mut dyn Host) -> Result<()> {
        let mut aggregate = SystemAggregate::default();

        for battery in &self.batteries {
            let logger = device_logger("poll", battery);
            let api = &battery.api;

            let (power, energy) = self
                .retry
                .run("power/energy status", &logger, || async move {
                    tokio::try_join!(api.get_power_status(), api.get_energy_status())
                })
                .await?;
            let reading = BatteryReading::from_status(&power, &energy);
            logger.debug(&format!(
                "soc={:.1}% power={}W setpoint={}W state={}",
                reading.state_of_charge, reading.power, reading.setpoint, reading.system_state
            ));

            let name = battery.config.name.as_str();
            CommonValues::from_reading(&reading).write(host, name)?;
            host.update_device(
                name,
                UNIT_SYSTEM_STATE,
                DeviceUpdate::text(reading.system_state.clone()),
            )?;
            aggregate.add(&reading);

            let strategy = match self
                .retry
                .run("power strategy", &logger, || api.get_power_strategy())
                .await
            {
                Ok(strategy) => Some(strategy),
                Err(SessyError::UnknownStrategy { value }) => {
                    logger.warn(&format!("Ignoring unknown power strategy {}", value));
                    None
                }
                Err(e) => return Err(e),
            };
            if let Some(strategy) = strategy {
                host.update_device(name, UNIT_STRATEGY, DeviceUpdate::level(strategy.level()))?;
            }
            aggregate.fold_strategy(strategy);
        }

        self.write_system(host, &aggregate)
    }

    fn write_system(&self, host: &mut dyn Host, aggregate: &SystemAggregate) -> Result<()> {
        let Some(state_of_charge) = aggregate.state_of_charge() else {
            return Ok(());
        };
        CommonValues::from_aggregate(aggregate, state_of_charge).write(host, SYSTEM_DEVICE_ID)?;
        host.update_device(
            SYSTEM_DEVICE_ID,
            UNIT_STRATEGY,
            DeviceUpdate::level(aggregate.strategy().level()),
        )?;
        self.logger.debug(&format!(
            "System: {} batteries, soc={:.1}% power={}W",
            aggregate.batteries(),
            state_of_charge,
            aggregate.power()
        ));
        Ok(())
    }

    pub(super) async fn poll_meters(&self, host: &mut dyn Host) -> Result<()> {
        for meter in &self.meters {
            let logger = device_logger("p1", meter);
            let api = &meter.api;
            let details = self
                .retry
                .run("P1 details", &logger, || api.get_p1_details())
                .await?;
            logger.debug(&format!(
                "state={} tariff={} net={}W",
                details.state, details.tariff_indicator, details.power_total
            ));

            let name = meter.config.name.as_str();
            host.update_device(
                name,
                UNIT_P1_METER,
                DeviceUpdate::text(smart_meter_value(&details)),
            )?;
            host.update_device(
                name,
                UNIT_P1_POWER,
                DeviceUpdate::text(details.power_total.to_string()),
            )?;
        }
        Ok(())
    }

    /// Show the current slot of the first battery's dynamic schedule
    ///
    /// Failures are logged only.
    pub(super) async fn poll_schedule(&self, host: &mut dyn Host) {
        let Some(battery) = self.batteries.first() else {
            return;
        };
        let logger = device_logger("schedule", battery);
        let now = host.now().with_timezone(&Local);

        let schedule: DaySchedule = match battery.api.get_dynamic_schedule(now.date_naive()).await
        {
            Ok(schedule) => schedule,
            Err(e) => {
                logger.warn(&format!("Dynamic schedule unavailable: {}", e));
                return;
            }
        };
        let (power, price) = schedule.at(now.time());
        if let Err(e) = host.update_device(
            SYSTEM_DEVICE_ID,
            UNIT_SCHEDULE,
            DeviceUpdate::text(schedule_text(power, price)),
        ) {
            logger.warn(&format!("Failed to store schedule: {}", e));
        }
    }
}
