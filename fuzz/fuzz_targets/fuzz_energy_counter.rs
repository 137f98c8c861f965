#![no_main]
use libfuzzer_sys::fuzz_target;
use sessy_bridge::energy::EnergyCounter;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let counter = EnergyCounter::parse(&text);
    assert!(counter.power.is_finite() && counter.wh.is_finite());

    // Whatever was stored, the next value must parse back
    let reparsed = EnergyCounter::parse(&counter.to_s_value());
    assert!(reparsed.wh.is_finite());
});
