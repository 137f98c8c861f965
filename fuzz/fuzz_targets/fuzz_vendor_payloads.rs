#![no_main]
use libfuzzer_sys::fuzz_target;
use sessy_bridge::sessy::{DynamicSchedule, EnergyStatus, P1Details, PowerStatus, PowerStrategy};

fuzz_target!(|data: &[u8]| {
    let _ = serde_json::from_slice::<PowerStatus>(data);
    let _ = serde_json::from_slice::<EnergyStatus>(data);
    let _ = serde_json::from_slice::<P1Details>(data);
    let _ = serde_json::from_slice::<PowerStrategy>(data);

    if let Ok(schedule) = serde_json::from_slice::<DynamicSchedule>(data)
        && let Some(days) = &schedule.power_strategy
        && let Some(first) = days.first()
        && let Ok(day) = schedule.for_date(first.date)
    {
        let _ = day.at(chrono::NaiveTime::MIN);
    }
});
