use crate::host::{DeviceKind, DeviceSpec, SYSTEM_DEVICE_ID};
use crate::sessy::PowerStrategy;

pub const UNIT_STATE_OF_CHARGE: u8 = 1;
pub const UNIT_POWER: u8 = 2;
pub const UNIT_CHARGED: u8 = 3;
pub const UNIT_DISCHARGED: u8 = 4;
pub const UNIT_STRATEGY: u8 = 5;
pub const UNIT_SETPOINT: u8 = 6;
pub const UNIT_SYSTEM_STATE: u8 = 7;
pub const UNIT_ENERGY_STORED: u8 = 8;
pub const UNIT_ENERGY_DELIVERED: u8 = 9;
pub const UNIT_SCHEDULE: u8 = 10;

pub const UNIT_P1_METER: u8 = 1;
pub const UNIT_P1_POWER: u8 = 2;

fn spec(device_id: &str, unit: u8, label: &str, kind: DeviceKind) -> DeviceSpec {
    DeviceSpec {
        device_id: device_id.to_string(),
        unit,
        name: format!("{} - {}", device_id, label),
        kind,
    }
}

/// Units shared by batteries and the system device
fn common_specs(device_id: &str) -> Vec<DeviceSpec> {
    vec![
        spec(device_id, UNIT_STATE_OF_CHARGE, "State of charge", DeviceKind::Percentage),
        spec(device_id, UNIT_POWER, "Power", DeviceKind::Usage),
        spec(device_id, UNIT_CHARGED, "Charged", DeviceKind::Counter),
        spec(device_id, UNIT_DISCHARGED, "Discharged", DeviceKind::Counter),
        spec(
            device_id,
            UNIT_STRATEGY,
            "Strategy",
            DeviceKind::Selector {
                levels: PowerStrategy::selector_levels(),
            },
        ),
        spec(device_id, UNIT_SETPOINT, "Setpoint", DeviceKind::Setpoint),
        spec(device_id, UNIT_ENERGY_STORED, "Energy stored", DeviceKind::Counter),
        spec(device_id, UNIT_ENERGY_DELIVERED, "Energy delivered", DeviceKind::Counter),
    ]
}

pub fn battery_specs(name: &str) -> Vec<DeviceSpec> {
    let mut specs = common_specs(name);
    specs.push(spec(name, UNIT_SYSTEM_STATE, "System state", DeviceKind::Text));
    specs
}

pub fn system_specs() -> Vec<DeviceSpec> {
    let mut specs = common_specs(SYSTEM_DEVICE_ID);
    specs.push(spec(SYSTEM_DEVICE_ID, UNIT_SCHEDULE, "Schedule", DeviceKind::Text));
    specs
}

pub fn p1_specs(name: &str) -> Vec<DeviceSpec> {
    vec![
        spec(name, UNIT_P1_METER, "Meter", DeviceKind::SmartMeter),
        spec(name, UNIT_P1_POWER, "Net power", DeviceKind::Usage),
    ]
}
